use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::components::ComponentScores;
use crate::score::config::Tier;

/// One row of the composite leaderboard. A derived, recomputable
/// projection of the user's component scores; rank is assigned by the
/// global re-rank pass, not maintained incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub components: ComponentScores,
    pub overall: f64,
    pub tier: Tier,
    /// None until the first global re-rank has seen this entry
    pub rank: Option<u32>,
    pub last_activity_at: DateTime<Utc>,
    /// Audit snapshot of the inputs behind this row
    pub snapshot: serde_json::Value,
    /// Set when scores changed after the last re-rank
    pub dirty: bool,
}

/// Pagination and filters for the leaderboard page query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub min_score: Option<f64>,
    pub tier: Option<Tier>,
}

impl LeaderboardQuery {
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0) as usize
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT) as usize
    }
}

/// Full per-user breakdown returned by the query API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBreakdown {
    pub user_id: String,
    pub components: ComponentScores,
    pub overall: f64,
    pub tier: Tier,
    pub rank: u32,
    pub last_activity_at: DateTime<Utc>,
}

impl UserBreakdown {
    /// Only valid after a re-rank pass; callers re-rank dirty state first
    pub fn from_entry(entry: &LeaderboardEntry) -> Option<Self> {
        Some(Self {
            user_id: entry.user_id.clone(),
            components: entry.components.clone(),
            overall: entry.overall,
            tier: entry.tier,
            rank: entry.rank?,
            last_activity_at: entry.last_activity_at,
        })
    }
}
