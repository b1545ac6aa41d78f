use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;

use skillboard::session::{GameKind, IngestRequest};

/// Builder for ingest requests with sensible defaults per game kind
pub struct SessionBuilder {
    user_id: String,
    game: GameKind,
    started_at: DateTime<Utc>,
    finished: bool,
    duration_secs: f64,
    wpm: Option<f64>,
    accuracy: Option<f64>,
    confidence: Option<f64>,
    dimensions: Option<BTreeMap<String, f64>>,
    score: Option<f64>,
}

impl SessionBuilder {
    pub fn typing(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            game: GameKind::Typing,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            finished: true,
            duration_secs: 60.0,
            wpm: Some(40.0),
            accuracy: Some(90.0),
            confidence: None,
            dimensions: None,
            score: None,
        }
    }

    #[allow(dead_code)]
    pub fn personality(user_id: &str) -> Self {
        Self {
            game: GameKind::Personality,
            wpm: None,
            accuracy: None,
            confidence: Some(80.0),
            ..Self::typing(user_id)
        }
    }

    #[allow(dead_code)]
    pub fn scored(user_id: &str, game: GameKind) -> Self {
        Self {
            game,
            wpm: None,
            accuracy: None,
            score: Some(75.0),
            ..Self::typing(user_id)
        }
    }

    pub fn wpm(mut self, wpm: f64) -> Self {
        self.wpm = Some(wpm);
        self
    }

    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    #[allow(dead_code)]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[allow(dead_code)]
    pub fn score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    #[allow(dead_code)]
    pub fn abandoned(mut self) -> Self {
        self.finished = false;
        self
    }

    /// Shifts the session start so repeated builds produce an ordered history
    pub fn at_offset_minutes(mut self, minutes: i64) -> Self {
        self.started_at += Duration::minutes(minutes);
        self
    }

    pub fn build(self) -> IngestRequest {
        let finished_at = self
            .finished
            .then(|| self.started_at + Duration::seconds(self.duration_secs as i64));
        IngestRequest {
            user_id: self.user_id,
            game: self.game,
            started_at: self.started_at,
            finished_at,
            duration_secs: self.duration_secs,
            wpm: self.wpm,
            accuracy: self.accuracy,
            confidence: self.confidence,
            dimensions: self.dimensions,
            score: self.score,
            achievements: None,
            analysis: None,
        }
    }
}
