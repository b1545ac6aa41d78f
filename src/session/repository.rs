use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{GameKind, SessionRecord};
use crate::shared::AppError;

/// Append-only store of completed game sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Durably records one session. Never mutates history.
    async fn append(&self, session: &SessionRecord) -> Result<(), AppError>;

    /// A user's full session history for one game, oldest first
    async fn list_for_user(
        &self,
        user_id: &str,
        game: GameKind,
    ) -> Result<Vec<SessionRecord>, AppError>;

    /// Timestamp of the user's most recent session across all games
    async fn latest_activity(&self, user_id: &str) -> Result<Option<DateTime<Utc>>, AppError>;

    /// Every user with at least one recorded session
    async fn user_ids(&self) -> Result<Vec<String>, AppError>;

    /// The games a user has at least one session for
    async fn games_played(&self, user_id: &str) -> Result<Vec<GameKind>, AppError>;
}

/// In-memory implementation for development and testing
pub struct InMemorySessionRepository {
    sessions: Mutex<Vec<SessionRecord>>,
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session))]
    async fn append(&self, session: &SessionRecord) -> Result<(), AppError> {
        debug!(session_id = %session.id, user_id = %session.user_id, game = %session.game, "Appending session in memory");
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        game: GameKind,
    ) -> Result<Vec<SessionRecord>, AppError> {
        let sessions = self.sessions.lock().unwrap();
        let mut matching: Vec<SessionRecord> = sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.game == game)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }

    async fn latest_activity(&self, user_id: &str) -> Result<Option<DateTime<Utc>>, AppError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.created_at)
            .max())
    }

    async fn user_ids(&self) -> Result<Vec<String>, AppError> {
        let sessions = self.sessions.lock().unwrap();
        let mut ids: Vec<String> = sessions.iter().map(|s| s.user_id.clone()).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn games_played(&self, user_id: &str) -> Result<Vec<GameKind>, AppError> {
        let sessions = self.sessions.lock().unwrap();
        let mut games: Vec<GameKind> = sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.game)
            .collect();
        games.sort();
        games.dedup();
        Ok(games)
    }
}

/// PostgreSQL implementation of the session store
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_session(row: &sqlx::postgres::PgRow) -> Result<SessionRecord, AppError> {
        let game_text: String = row.get("game");
        let game = GameKind::from_str(&game_text)
            .map_err(|_| AppError::DatabaseError(format!("unknown game kind '{}'", game_text)))?;
        let metrics: serde_json::Value = row.get("metrics");
        let metrics = serde_json::from_value(metrics)
            .map_err(|e| AppError::DatabaseError(format!("bad metrics payload: {}", e)))?;
        let achievements: serde_json::Value = row.get("achievements");
        let achievements = serde_json::from_value(achievements)
            .map_err(|e| AppError::DatabaseError(format!("bad achievements payload: {}", e)))?;

        Ok(SessionRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            game,
            started_at: row.get("started_at"),
            finished_at: row.get("finished_at"),
            duration_secs: row.get("duration_secs"),
            metrics,
            achievements,
            analysis: row.get("analysis"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[instrument(skip(self, session))]
    async fn append(&self, session: &SessionRecord) -> Result<(), AppError> {
        debug!(session_id = %session.id, user_id = %session.user_id, game = %session.game, "Appending session in database");

        let metrics = serde_json::to_value(&session.metrics)
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        let achievements = serde_json::to_value(&session.achievements)
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO game_sessions \
             (id, user_id, game, started_at, finished_at, duration_secs, metrics, achievements, analysis, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.game.to_string())
        .bind(session.started_at)
        .bind(session.finished_at)
        .bind(session.duration_secs)
        .bind(metrics)
        .bind(achievements)
        .bind(&session.analysis)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to append session in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: &str,
        game: GameKind,
    ) -> Result<Vec<SessionRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, game, started_at, finished_at, duration_secs, metrics, achievements, analysis, created_at \
             FROM game_sessions WHERE user_id = $1 AND game = $2 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(game.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.iter().map(Self::row_to_session).collect()
    }

    #[instrument(skip(self))]
    async fn latest_activity(&self, user_id: &str) -> Result<Option<DateTime<Utc>>, AppError> {
        let row = sqlx::query(
            "SELECT MAX(created_at) AS latest FROM game_sessions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.get("latest"))
    }

    #[instrument(skip(self))]
    async fn user_ids(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT DISTINCT user_id FROM game_sessions ORDER BY user_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.iter().map(|row| row.get("user_id")).collect())
    }

    #[instrument(skip(self))]
    async fn games_played(&self, user_id: &str) -> Result<Vec<GameKind>, AppError> {
        let rows = sqlx::query("SELECT DISTINCT game FROM game_sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let mut games = Vec::with_capacity(rows.len());
        for row in &rows {
            let game_text: String = row.get("game");
            match GameKind::from_str(&game_text) {
                Ok(game) => games.push(game),
                Err(_) => warn!(game = %game_text, "Skipping unknown game kind in session table"),
            }
        }
        games.sort();
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::models::GameMetrics;

    fn session(user_id: &str, game: GameKind, primary: f64) -> SessionRecord {
        let metrics = match game {
            GameKind::Typing => GameMetrics::Typing {
                wpm: primary,
                accuracy: 95.0,
            },
            _ => GameMetrics::Scored { score: primary },
        };
        SessionRecord::new(
            user_id.to_string(),
            game,
            Utc::now(),
            Some(Utc::now()),
            60.0,
            metrics,
            vec![],
            None,
        )
    }

    #[tokio::test]
    async fn lists_sessions_for_user_and_game_only() {
        let repo = InMemorySessionRepository::new();
        repo.append(&session("alice", GameKind::Typing, 40.0))
            .await
            .unwrap();
        repo.append(&session("alice", GameKind::Cultural, 70.0))
            .await
            .unwrap();
        repo.append(&session("bob", GameKind::Typing, 55.0))
            .await
            .unwrap();

        let alice_typing = repo.list_for_user("alice", GameKind::Typing).await.unwrap();
        assert_eq!(alice_typing.len(), 1);
        assert_eq!(alice_typing[0].metrics.primary(), 40.0);

        assert_eq!(repo.session_count(), 3);
    }

    #[tokio::test]
    async fn tracks_distinct_users_and_games() {
        let repo = InMemorySessionRepository::new();
        repo.append(&session("alice", GameKind::Typing, 40.0))
            .await
            .unwrap();
        repo.append(&session("alice", GameKind::Typing, 45.0))
            .await
            .unwrap();
        repo.append(&session("alice", GameKind::Triage, 80.0))
            .await
            .unwrap();

        assert_eq!(repo.user_ids().await.unwrap(), vec!["alice".to_string()]);
        assert_eq!(
            repo.games_played("alice").await.unwrap(),
            vec![GameKind::Typing, GameKind::Triage]
        );
        assert!(repo.latest_activity("alice").await.unwrap().is_some());
        assert!(repo.latest_activity("nobody").await.unwrap().is_none());
    }
}
