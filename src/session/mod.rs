pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod validate;

pub use handlers::ingest_session;
pub use models::{GameKind, GameMetrics, MetricDirection, SessionRecord};
pub use repository::{InMemorySessionRepository, PostgresSessionRepository, SessionRepository};
pub use service::SessionIngestor;
pub use validate::IngestRequest;
