use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::leaderboard::service::LeaderboardService;
use crate::pipeline::ScorePipeline;
use crate::session::service::SessionIngestor;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<SessionIngestor>,
    pub leaderboard: Arc<LeaderboardService>,
    pub pipeline: Arc<ScorePipeline>,
}

impl AppState {
    pub fn new(
        ingestor: Arc<SessionIngestor>,
        leaderboard: Arc<LeaderboardService>,
        pipeline: Arc<ScorePipeline>,
    ) -> Self {
        Self {
            ingestor,
            leaderboard,
            pipeline,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Shorthand for a validation failure naming the offending field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid field '{}': {}", field, message), "field": field }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("Database error: {}", msg) }),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
