use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument};

use super::models::{LeaderboardEntry, LeaderboardQuery};
use crate::score::config::Tier;
use crate::shared::AppError;

/// Store of leaderboard rows. Ranks are written only by the global
/// re-rank pass; score updates mark rows dirty instead.
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    async fn upsert(&self, entry: &LeaderboardEntry) -> Result<(), AppError>;

    async fn get(&self, user_id: &str) -> Result<Option<LeaderboardEntry>, AppError>;

    /// Every entry, for the global rank pass
    async fn all(&self) -> Result<Vec<LeaderboardEntry>, AppError>;

    /// Writes back rank positions from a rank pass. A row whose score
    /// changed since the pass read its snapshot stays dirty.
    async fn store_ranked(&self, entries: &[LeaderboardEntry]) -> Result<(), AppError>;

    async fn any_dirty(&self) -> Result<bool, AppError>;

    /// One ordered page, best rank first, after filters
    async fn page(&self, query: &LeaderboardQuery) -> Result<Vec<LeaderboardEntry>, AppError>;

    /// Number of entries matching the query's filters, ignoring pagination
    async fn count(&self, query: &LeaderboardQuery) -> Result<usize, AppError>;

    async fn user_ids(&self) -> Result<Vec<String>, AppError>;
}

/// In-memory implementation for development and testing
pub struct InMemoryLeaderboardRepository {
    entries: Mutex<HashMap<String, LeaderboardEntry>>,
}

impl Default for InMemoryLeaderboardRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLeaderboardRepository {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

fn matches_filters(entry: &LeaderboardEntry, query: &LeaderboardQuery) -> bool {
    query.min_score.map_or(true, |min| entry.overall >= min)
        && query.tier.map_or(true, |tier| entry.tier == tier)
}

fn page_of(mut entries: Vec<LeaderboardEntry>, query: &LeaderboardQuery) -> Vec<LeaderboardEntry> {
    entries.retain(|entry| matches_filters(entry, query));
    entries.sort_by(|a, b| {
        a.rank
            .unwrap_or(u32::MAX)
            .cmp(&b.rank.unwrap_or(u32::MAX))
            .then_with(|| a.last_activity_at.cmp(&b.last_activity_at))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    entries
        .into_iter()
        .skip(query.offset())
        .take(query.limit())
        .collect()
}

#[async_trait]
impl LeaderboardRepository for InMemoryLeaderboardRepository {
    async fn upsert(&self, entry: &LeaderboardEntry) -> Result<(), AppError> {
        debug!(user_id = %entry.user_id, overall = entry.overall, "Upserting leaderboard entry in memory");
        self.entries
            .lock()
            .unwrap()
            .insert(entry.user_id.clone(), entry.clone());
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<LeaderboardEntry>, AppError> {
        Ok(self.entries.lock().unwrap().get(user_id).cloned())
    }

    async fn all(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries = self.entries.lock().unwrap();
        let mut all: Vec<LeaderboardEntry> = entries.values().cloned().collect();
        all.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(all)
    }

    async fn store_ranked(&self, ranked: &[LeaderboardEntry]) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        for snapshot in ranked {
            if let Some(live) = entries.get_mut(&snapshot.user_id) {
                live.rank = snapshot.rank;
                // a score written after the pass read must stay dirty
                if live.overall == snapshot.overall {
                    live.dirty = false;
                }
            }
        }
        Ok(())
    }

    async fn any_dirty(&self) -> Result<bool, AppError> {
        Ok(self.entries.lock().unwrap().values().any(|e| e.dirty))
    }

    async fn page(&self, query: &LeaderboardQuery) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries: Vec<LeaderboardEntry> =
            self.entries.lock().unwrap().values().cloned().collect();
        Ok(page_of(entries, query))
    }

    async fn count(&self, query: &LeaderboardQuery) -> Result<usize, AppError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .values()
            .filter(|entry| matches_filters(entry, query))
            .count())
    }

    async fn user_ids(&self) -> Result<Vec<String>, AppError> {
        let entries = self.entries.lock().unwrap();
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// PostgreSQL implementation of the leaderboard store
pub struct PostgresLeaderboardRepository {
    pool: PgPool,
}

impl PostgresLeaderboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: &sqlx::postgres::PgRow) -> Result<LeaderboardEntry, AppError> {
        let tier_text: String = row.get("tier");
        let tier = Tier::from_str(&tier_text)
            .map_err(|_| AppError::DatabaseError(format!("unknown tier '{}'", tier_text)))?;
        let components: serde_json::Value = row.get("components");
        let components = serde_json::from_value(components)
            .map_err(|e| AppError::DatabaseError(format!("bad components payload: {}", e)))?;
        let rank: Option<i32> = row.get("rank");

        Ok(LeaderboardEntry {
            user_id: row.get("user_id"),
            components,
            overall: row.get("overall"),
            tier,
            rank: rank.map(|r| r as u32),
            last_activity_at: row.get("last_activity_at"),
            snapshot: row.get("snapshot"),
            dirty: row.get("dirty"),
        })
    }

    async fn write_entry(&self, entry: &LeaderboardEntry) -> Result<(), AppError> {
        let components = serde_json::to_value(&entry.components)
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO leaderboard_entries \
             (user_id, components, overall, tier, rank, last_activity_at, snapshot, dirty) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id) DO UPDATE SET \
               components = EXCLUDED.components, \
               overall = EXCLUDED.overall, \
               tier = EXCLUDED.tier, \
               rank = EXCLUDED.rank, \
               last_activity_at = EXCLUDED.last_activity_at, \
               snapshot = EXCLUDED.snapshot, \
               dirty = EXCLUDED.dirty",
        )
        .bind(&entry.user_id)
        .bind(components)
        .bind(entry.overall)
        .bind(entry.tier.to_string())
        .bind(entry.rank.map(|r| r as i32))
        .bind(entry.last_activity_at)
        .bind(&entry.snapshot)
        .bind(entry.dirty)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl LeaderboardRepository for PostgresLeaderboardRepository {
    #[instrument(skip(self, entry))]
    async fn upsert(&self, entry: &LeaderboardEntry) -> Result<(), AppError> {
        debug!(user_id = %entry.user_id, overall = entry.overall, "Upserting leaderboard entry in database");
        self.write_entry(entry).await
    }

    #[instrument(skip(self))]
    async fn get(&self, user_id: &str) -> Result<Option<LeaderboardEntry>, AppError> {
        let row = sqlx::query(
            "SELECT user_id, components, overall, tier, rank, last_activity_at, snapshot, dirty \
             FROM leaderboard_entries WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    #[instrument(skip(self))]
    async fn all(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT user_id, components, overall, tier, rank, last_activity_at, snapshot, dirty \
             FROM leaderboard_entries ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    #[instrument(skip(self, entries))]
    async fn store_ranked(&self, entries: &[LeaderboardEntry]) -> Result<(), AppError> {
        for entry in entries {
            sqlx::query(
                "UPDATE leaderboard_entries \
                 SET rank = $2, dirty = (dirty AND overall IS DISTINCT FROM $3) \
                 WHERE user_id = $1",
            )
            .bind(&entry.user_id)
            .bind(entry.rank.map(|r| r as i32))
            .bind(entry.overall)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn any_dirty(&self) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM leaderboard_entries WHERE dirty) AS any_dirty")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(row.get("any_dirty"))
    }

    #[instrument(skip(self))]
    async fn page(&self, query: &LeaderboardQuery) -> Result<Vec<LeaderboardEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT user_id, components, overall, tier, rank, last_activity_at, snapshot, dirty \
             FROM leaderboard_entries \
             WHERE ($1::float8 IS NULL OR overall >= $1) \
               AND ($2::text IS NULL OR tier = $2) \
             ORDER BY rank ASC NULLS LAST, last_activity_at ASC, user_id ASC \
             OFFSET $3 LIMIT $4",
        )
        .bind(query.min_score)
        .bind(query.tier.map(|t| t.to_string()))
        .bind(query.offset() as i64)
        .bind(query.limit() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    #[instrument(skip(self))]
    async fn count(&self, query: &LeaderboardQuery) -> Result<usize, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM leaderboard_entries \
             WHERE ($1::float8 IS NULL OR overall >= $1) \
               AND ($2::text IS NULL OR tier = $2)",
        )
        .bind(query.min_score)
        .bind(query.tier.map(|t| t.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let total: i64 = row.get("total");
        Ok(total as usize)
    }

    #[instrument(skip(self))]
    async fn user_ids(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT user_id FROM leaderboard_entries ORDER BY user_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(rows.iter().map(|row| row.get("user_id")).collect())
    }
}
