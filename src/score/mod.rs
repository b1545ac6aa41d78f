pub mod components;
pub mod config;
pub mod service;

pub use components::{overall_score, ComponentScore, ComponentScores};
pub use config::{ComponentWeights, ConfigError, ScoringConfig, Tier};
pub use service::{ScoreService, ScoredUser};
