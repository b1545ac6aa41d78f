use axum::{extract::State, Json};
use tracing::instrument;

use super::service::IngestResponse;
use super::validate::IngestRequest;
use crate::shared::{AppError, AppState};

/// HTTP handler for ingesting one completed game session
///
/// POST /sessions
/// Returns the generated session id, or 400 naming the offending field
#[instrument(name = "ingest_session", skip(state, request))]
pub async fn ingest_session(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    let response = state.ingestor.ingest(request).await?;
    Ok(Json(response))
}
