use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skillboard::leaderboard::repository::InMemoryLeaderboardRepository;
use skillboard::leaderboard::{handlers as leaderboard_handlers, LeaderboardService};
use skillboard::pipeline::ScorePipeline;
use skillboard::score::{ScoreService, ScoringConfig};
use skillboard::session::repository::InMemorySessionRepository;
use skillboard::session::{handlers as session_handlers, SessionIngestor};
use skillboard::shared::AppState;
use skillboard::signals::InMemorySignalProvider;
use skillboard::stats::{InMemoryStatsRepository, StatsService};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skillboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting skill statistics and leaderboard engine");

    let config = ScoringConfig::default();
    config
        .validate()
        .expect("default scoring configuration must be valid");

    // In-memory stores by default. For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let session_repository = Arc::new(PostgresSessionRepository::new(pool.clone()));
    // let stats_repository = Arc::new(PostgresStatsRepository::new(pool.clone()));
    // let leaderboard_repository = Arc::new(PostgresLeaderboardRepository::new(pool));
    let session_repository = Arc::new(InMemorySessionRepository::new());
    let stats_repository = Arc::new(InMemoryStatsRepository::new());
    let leaderboard_repository = Arc::new(InMemoryLeaderboardRepository::new());
    let signal_provider = Arc::new(InMemorySignalProvider::new());

    let stats_service = Arc::new(StatsService::new(
        stats_repository.clone(),
        session_repository.clone(),
    ));
    let score_service = Arc::new(ScoreService::new(
        config,
        stats_repository,
        signal_provider,
    ));
    let leaderboard_service = Arc::new(LeaderboardService::new(leaderboard_repository));
    let pipeline = Arc::new(ScorePipeline::new(
        session_repository.clone(),
        stats_service,
        score_service,
        leaderboard_service.clone(),
    ));
    let ingestor = Arc::new(SessionIngestor::new(session_repository, pipeline.clone()));

    let app_state = AppState::new(ingestor, leaderboard_service, pipeline);

    let app = Router::new()
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
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("failed to bind port 3000");
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.expect("server error");
}
