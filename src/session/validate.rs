use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::models::{GameKind, GameMetrics, SessionRecord};
use crate::shared::AppError;

/// Candidate session as submitted by a game client. Metric fields are all
/// optional on the wire; which ones are required depends on the game kind.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub user_id: String,
    pub game: GameKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub wpm: Option<f64>,
    pub accuracy: Option<f64>,
    pub confidence: Option<f64>,
    pub dimensions: Option<BTreeMap<String, f64>>,
    pub score: Option<f64>,
    pub achievements: Option<Vec<String>>,
    pub analysis: Option<serde_json::Value>,
}

const WPM_MAX: f64 = 400.0;

/// Validates a candidate session and builds the immutable record.
/// The first offending field is named in the returned error; nothing is
/// persisted and no recompute is triggered for a rejected session.
pub fn validate(request: IngestRequest) -> Result<SessionRecord, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::validation("user_id", "must not be empty"));
    }

    check_finite("duration_secs", request.duration_secs)?;
    if request.duration_secs < 0.0 {
        return Err(AppError::validation(
            "duration_secs",
            "must not be negative",
        ));
    }

    if let Some(finished_at) = request.finished_at {
        if finished_at < request.started_at {
            return Err(AppError::validation(
                "finished_at",
                "must not precede started_at",
            ));
        }
    }

    let metrics = match request.game {
        GameKind::Typing => {
            let wpm = required("wpm", request.wpm)?;
            check_range("wpm", wpm, 0.0, WPM_MAX)?;
            let accuracy = required("accuracy", request.accuracy)?;
            check_percentage("accuracy", accuracy)?;
            GameMetrics::Typing { wpm, accuracy }
        }
        GameKind::Personality => {
            let confidence = required("confidence", request.confidence)?;
            check_percentage("confidence", confidence)?;
            let dimensions = request.dimensions.unwrap_or_default();
            for (name, value) in &dimensions {
                check_percentage(&format!("dimensions.{}", name), *value)?;
            }
            GameMetrics::Personality {
                confidence,
                dimensions,
            }
        }
        GameKind::Cultural | GameKind::Triage | GameKind::Ultimate => {
            let score = required("score", request.score)?;
            check_percentage("score", score)?;
            GameMetrics::Scored { score }
        }
    };

    Ok(SessionRecord::new(
        request.user_id,
        request.game,
        request.started_at,
        request.finished_at,
        request.duration_secs,
        metrics,
        request.achievements.unwrap_or_default(),
        request.analysis,
    ))
}

fn required(field: &str, value: Option<f64>) -> Result<f64, AppError> {
    match value {
        Some(value) => {
            check_finite(field, value)?;
            Ok(value)
        }
        None => Err(AppError::validation(field, "is required for this game")),
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AppError::validation(field, "must be a finite number"))
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), AppError> {
    if value < min || value > max {
        return Err(AppError::validation(
            field,
            format!("must be within [{}, {}]", min, max),
        ));
    }
    Ok(())
}

fn check_percentage(field: &str, value: f64) -> Result<(), AppError> {
    check_finite(field, value)?;
    check_range(field, value, 0.0, 100.0)
}
