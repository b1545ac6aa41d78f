pub mod handlers;
pub mod models;
pub mod ranking;
pub mod repository;
pub mod service;

pub use models::{LeaderboardEntry, LeaderboardQuery, UserBreakdown};
pub use ranking::rank_entries;
pub use repository::{
    InMemoryLeaderboardRepository, LeaderboardRepository, PostgresLeaderboardRepository,
};
pub use service::LeaderboardService;
