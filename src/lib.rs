// Library crate for the skill statistics and leaderboard engine
// This file exposes the public API for integration tests

pub mod leaderboard;
pub mod pipeline;
pub mod score;
pub mod session;
pub mod shared;
pub mod signals;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use leaderboard::{LeaderboardEntry, LeaderboardQuery, LeaderboardService, UserBreakdown};
pub use pipeline::ScorePipeline;
pub use score::{ScoreService, ScoringConfig, Tier};
pub use session::{GameKind, IngestRequest, SessionIngestor, SessionRecord};
pub use shared::{AppError, AppState};
pub use signals::{ApplicationStatus, ProfileChecklist, ResumeSignal};
pub use stats::{GameStat, StatsService};
