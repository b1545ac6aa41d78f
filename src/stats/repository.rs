use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument};

use super::errors::StatsError;
use super::models::{GameStat, PopulationBest};
use crate::session::models::GameKind;

/// Store of materialized per-user, per-game aggregates
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Replaces the stat for (user, game). Recomputed, never appended.
    async fn upsert(&self, stat: &GameStat) -> Result<(), StatsError>;

    async fn get(&self, user_id: &str, game: GameKind) -> Result<Option<GameStat>, StatsError>;

    /// Every user's current best value for a game, for percentile scans.
    /// May be read under weaker consistency; callers tolerate corrupt rows.
    async fn population_best(&self, game: GameKind) -> Result<Vec<PopulationBest>, StatsError>;
}

/// In-memory implementation for development and testing
pub struct InMemoryStatsRepository {
    stats: Mutex<HashMap<(String, GameKind), GameStat>>,
}

impl Default for InMemoryStatsRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Test hook: plant a population row directly, bypassing aggregation
    pub fn insert_raw(&self, stat: GameStat) {
        self.stats
            .lock()
            .unwrap()
            .insert((stat.user_id.clone(), stat.game), stat);
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn upsert(&self, stat: &GameStat) -> Result<(), StatsError> {
        debug!(user_id = %stat.user_id, game = %stat.game, best = stat.best, "Upserting game stat in memory");
        self.stats
            .lock()
            .unwrap()
            .insert((stat.user_id.clone(), stat.game), stat.clone());
        Ok(())
    }

    async fn get(&self, user_id: &str, game: GameKind) -> Result<Option<GameStat>, StatsError> {
        let stats = self.stats.lock().unwrap();
        Ok(stats.get(&(user_id.to_string(), game)).cloned())
    }

    async fn population_best(&self, game: GameKind) -> Result<Vec<PopulationBest>, StatsError> {
        let stats = self.stats.lock().unwrap();
        let mut population: Vec<PopulationBest> = stats
            .values()
            .filter(|stat| stat.game == game)
            .map(|stat| PopulationBest {
                user_id: stat.user_id.clone(),
                best: stat.best,
            })
            .collect();
        population.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(population)
    }
}

/// PostgreSQL implementation of the stats store
pub struct PostgresStatsRepository {
    pool: PgPool,
}

impl PostgresStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for PostgresStatsRepository {
    #[instrument(skip(self, stat))]
    async fn upsert(&self, stat: &GameStat) -> Result<(), StatsError> {
        debug!(user_id = %stat.user_id, game = %stat.game, "Upserting game stat in database");

        sqlx::query(
            "INSERT INTO game_stats \
             (user_id, game, total_sessions, completed_sessions, last_played_at, best, \
              best_achieved_at, best_accuracy, recent, recent_accuracy, median, \
              consistency_index, percentile, snapshot) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (user_id, game) DO UPDATE SET \
               total_sessions = EXCLUDED.total_sessions, \
               completed_sessions = EXCLUDED.completed_sessions, \
               last_played_at = EXCLUDED.last_played_at, \
               best = EXCLUDED.best, \
               best_achieved_at = EXCLUDED.best_achieved_at, \
               best_accuracy = EXCLUDED.best_accuracy, \
               recent = EXCLUDED.recent, \
               recent_accuracy = EXCLUDED.recent_accuracy, \
               median = EXCLUDED.median, \
               consistency_index = EXCLUDED.consistency_index, \
               percentile = EXCLUDED.percentile, \
               snapshot = EXCLUDED.snapshot",
        )
        .bind(&stat.user_id)
        .bind(stat.game.to_string())
        .bind(stat.total_sessions as i64)
        .bind(stat.completed_sessions as i64)
        .bind(stat.last_played_at)
        .bind(stat.best)
        .bind(stat.best_achieved_at)
        .bind(stat.best_accuracy)
        .bind(stat.recent)
        .bind(stat.recent_accuracy)
        .bind(stat.median)
        .bind(stat.consistency_index)
        .bind(stat.percentile)
        .bind(&stat.snapshot)
        .execute(&self.pool)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, user_id: &str, game: GameKind) -> Result<Option<GameStat>, StatsError> {
        let row = sqlx::query(
            "SELECT user_id, game, total_sessions, completed_sessions, last_played_at, best, \
                    best_achieved_at, best_accuracy, recent, recent_accuracy, median, \
                    consistency_index, percentile, snapshot \
             FROM game_stats WHERE user_id = $1 AND game = $2",
        )
        .bind(user_id)
        .bind(game.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let game_text: String = row.get("game");
        let game = GameKind::from_str(&game_text)
            .map_err(|_| StatsError::Repository(format!("unknown game kind '{}'", game_text)))?;
        let total_sessions: i64 = row.get("total_sessions");
        let completed_sessions: i64 = row.get("completed_sessions");

        Ok(Some(GameStat {
            user_id: row.get("user_id"),
            game,
            total_sessions: total_sessions as u32,
            completed_sessions: completed_sessions as u32,
            last_played_at: row.get("last_played_at"),
            best: row.get("best"),
            best_achieved_at: row.get("best_achieved_at"),
            best_accuracy: row.get("best_accuracy"),
            recent: row.get("recent"),
            recent_accuracy: row.get("recent_accuracy"),
            median: row.get("median"),
            consistency_index: row.get("consistency_index"),
            percentile: row.get("percentile"),
            snapshot: row.get("snapshot"),
        }))
    }

    #[instrument(skip(self))]
    async fn population_best(&self, game: GameKind) -> Result<Vec<PopulationBest>, StatsError> {
        let rows = sqlx::query(
            "SELECT user_id, best FROM game_stats WHERE game = $1 ORDER BY user_id",
        )
        .bind(game.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StatsError::Repository(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| PopulationBest {
                user_id: row.get("user_id"),
                best: row.get("best"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn stat(user_id: &str, game: GameKind, best: f64) -> GameStat {
        GameStat {
            user_id: user_id.to_string(),
            game,
            total_sessions: 1,
            completed_sessions: 1,
            last_played_at: Utc::now(),
            best,
            best_achieved_at: Utc::now(),
            best_accuracy: None,
            recent: best,
            recent_accuracy: None,
            median: Some(best),
            consistency_index: 50.0,
            percentile: 100.0,
            snapshot: json!({}),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_existing_stat() {
        let repo = InMemoryStatsRepository::new();
        repo.upsert(&stat("alice", GameKind::Typing, 40.0))
            .await
            .unwrap();
        repo.upsert(&stat("alice", GameKind::Typing, 45.0))
            .await
            .unwrap();

        let stored = repo.get("alice", GameKind::Typing).await.unwrap().unwrap();
        assert_eq!(stored.best, 45.0);
    }

    #[tokio::test]
    async fn population_best_is_scoped_to_the_game() {
        let repo = InMemoryStatsRepository::new();
        repo.upsert(&stat("alice", GameKind::Typing, 40.0))
            .await
            .unwrap();
        repo.upsert(&stat("bob", GameKind::Typing, 55.0))
            .await
            .unwrap();
        repo.upsert(&stat("alice", GameKind::Triage, 80.0))
            .await
            .unwrap();

        let population = repo.population_best(GameKind::Typing).await.unwrap();
        assert_eq!(population.len(), 2);
        assert_eq!(population[0].user_id, "alice");
        assert_eq!(population[1].user_id, "bob");
    }

    #[tokio::test]
    async fn missing_stat_reads_as_none() {
        let repo = InMemoryStatsRepository::new();
        assert!(repo.get("ghost", GameKind::Ultimate).await.unwrap().is_none());
    }
}
