pub mod aggregate;
pub mod models;
pub mod repository;
pub mod service;

mod errors;

pub use aggregate::{compute_game_stat, CONSISTENCY_NEUTRAL};
pub use errors::StatsError;
pub use models::{GameStat, PopulationBest};
pub use repository::{InMemoryStatsRepository, PostgresStatsRepository, StatsRepository};
pub use service::StatsService;
