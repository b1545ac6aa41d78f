use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use skillboard::{
    leaderboard::{
        handlers as leaderboard_handlers, repository::InMemoryLeaderboardRepository,
        LeaderboardService,
    },
    pipeline::ScorePipeline,
    score::{ScoreService, ScoringConfig},
    session::{handlers as session_handlers, repository::InMemorySessionRepository, SessionIngestor},
    shared::AppState,
    signals::InMemorySignalProvider,
    stats::{InMemoryStatsRepository, StatsService},
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub sessions: Arc<InMemorySessionRepository>,
    pub stats: Arc<InMemoryStatsRepository>,
    pub entries: Arc<InMemoryLeaderboardRepository>,
    pub signals: Arc<InMemorySignalProvider>,
}

pub struct TestSetupBuilder {
    config: ScoringConfig,
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }

    #[allow(dead_code)]
    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TestSetup {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let stats = Arc::new(InMemoryStatsRepository::new());
        let entries = Arc::new(InMemoryLeaderboardRepository::new());
        let signals = Arc::new(InMemorySignalProvider::new());

        let stats_service = Arc::new(StatsService::new(stats.clone(), sessions.clone()));
        let score_service = Arc::new(ScoreService::new(
            self.config,
            stats.clone(),
            signals.clone(),
        ));
        let leaderboard = Arc::new(LeaderboardService::new(entries.clone()));
        let pipeline = Arc::new(ScorePipeline::new(
            sessions.clone(),
            stats_service,
            score_service,
            leaderboard.clone(),
        ));
        let ingestor = Arc::new(SessionIngestor::new(sessions.clone(), pipeline.clone()));

        TestSetup {
            state: AppState::new(ingestor, leaderboard, pipeline),
            sessions,
            stats,
            entries,
            signals,
        }
    }
}

/// The full HTTP surface, wired the same way the binary wires it
#[allow(dead_code)]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(session_handlers::ingest_session))
        .route(
            "/users/:user_id/breakdown",
            get(leaderboard_handlers::get_breakdown),
        )
        .route(
            "/users/:user_id/refresh",
            post(leaderboard_handlers::refresh_user),
        )
        .route("/leaderboard", get(leaderboard_handlers::get_leaderboard))
        .route(
            "/leaderboard/rerank",
            post(leaderboard_handlers::trigger_rerank),
        )
        .with_state(state)
}
