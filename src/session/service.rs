use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::repository::SessionRepository;
use super::validate::{validate, IngestRequest};
use crate::pipeline::ScorePipeline;
use crate::shared::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub session_id: String,
}

/// Session Ingestor. Validates candidate sessions, appends them to the
/// immutable history, then drives the recompute chain for (user, game).
pub struct SessionIngestor {
    repository: Arc<dyn SessionRepository>,
    pipeline: Arc<ScorePipeline>,
}

impl SessionIngestor {
    pub fn new(repository: Arc<dyn SessionRepository>, pipeline: Arc<ScorePipeline>) -> Self {
        Self {
            repository,
            pipeline,
        }
    }

    /// Validates and records one completed session. On success the
    /// aggregation chain runs synchronously; a downstream failure there
    /// does not roll back the append, since the next event recomputes
    /// from the full history and self-heals.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, game = %request.game))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, AppError> {
        let record = validate(request)?;

        self.repository.append(&record).await?;
        info!(session_id = %record.id, "Session recorded");

        if let Err(err) = self
            .pipeline
            .process_session(&record.user_id, record.game)
            .await
        {
            warn!(
                session_id = %record.id,
                error = %err,
                "Recompute chain failed after append; will self-heal on next event"
            );
        }

        Ok(IngestResponse {
            session_id: record.id,
        })
    }
}
