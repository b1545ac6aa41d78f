use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::models::GameKind;

/// Per-user, per-game rolling aggregate. Always a pure function of the
/// user's session history plus the population of best values at compute
/// time; a materialized cache, never an independent source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStat {
    pub user_id: String,
    pub game: GameKind,
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub last_played_at: DateTime<Utc>,
    /// Historically best primary metric (max or min per the game's
    /// direction). Ties resolved by the earliest session achieving it.
    pub best: f64,
    pub best_achieved_at: DateTime<Utc>,
    /// Historically best auxiliary accuracy across finished sessions,
    /// independent of which session holds the best primary metric
    pub best_accuracy: Option<f64>,
    /// Primary metric of the most recently finished session
    pub recent: f64,
    pub recent_accuracy: Option<f64>,
    pub median: Option<f64>,
    /// 0-100, how close recent performance sits to best
    pub consistency_index: f64,
    /// 0-100, standing among other users' best values
    pub percentile: f64,
    pub snapshot: serde_json::Value,
}

/// One user's best value for a game, as seen during a population scan
#[derive(Debug, Clone)]
pub struct PopulationBest {
    pub user_id: String,
    pub best: f64,
}
