use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// The skill games whose completed sessions feed the leaderboard engine
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GameKind {
    Typing,
    Personality,
    Cultural,
    Triage,
    Ultimate,
}

/// Whether a larger primary metric value is a better result for a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    HigherIsBetter,
    LowerIsBetter,
}

impl GameKind {
    /// Direction of the game's primary metric. All current games score
    /// "higher is better"; the aggregator honors either direction.
    pub fn metric_direction(&self) -> MetricDirection {
        match self {
            GameKind::Typing
            | GameKind::Personality
            | GameKind::Cultural
            | GameKind::Triage
            | GameKind::Ultimate => MetricDirection::HigherIsBetter,
        }
    }
}

/// Game-specific numeric metrics carried by a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMetrics {
    Typing {
        wpm: f64,
        accuracy: f64,
    },
    Personality {
        confidence: f64,
        dimensions: BTreeMap<String, f64>,
    },
    /// Cultural, triage and ultimate sessions carry one composite sub-score
    Scored {
        score: f64,
    },
}

impl GameMetrics {
    /// The primary metric the aggregator tracks best/recent for
    pub fn primary(&self) -> f64 {
        match self {
            GameMetrics::Typing { wpm, .. } => *wpm,
            GameMetrics::Personality { confidence, .. } => *confidence,
            GameMetrics::Scored { score } => *score,
        }
    }

    /// Auxiliary accuracy carried through unmodified (typing only)
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            GameMetrics::Typing { accuracy, .. } => Some(*accuracy),
            _ => None,
        }
    }
}

/// One completed attempt at a skill game. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String, // UUID v4 as string
    pub user_id: String,
    pub game: GameKind,
    pub started_at: DateTime<Utc>,
    /// None means the attempt was abandoned; excluded from completed
    /// counts and from best/recent metrics
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub metrics: GameMetrics,
    pub achievements: Vec<String>,
    pub analysis: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        user_id: String,
        game: GameKind,
        started_at: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
        duration_secs: f64,
        metrics: GameMetrics,
        achievements: Vec<String>,
        analysis: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            game,
            started_at,
            finished_at,
            duration_secs,
            metrics,
            achievements,
            analysis,
            created_at: Utc::now(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn game_kind_round_trips_through_strings() {
        for (kind, text) in [
            (GameKind::Typing, "TYPING"),
            (GameKind::Personality, "PERSONALITY"),
            (GameKind::Cultural, "CULTURAL"),
            (GameKind::Triage, "TRIAGE"),
            (GameKind::Ultimate, "ULTIMATE"),
        ] {
            assert_eq!(kind.to_string(), text);
            assert_eq!(GameKind::from_str(text).unwrap(), kind);
        }
    }

    #[test]
    fn primary_metric_follows_game_kind() {
        let typing = GameMetrics::Typing {
            wpm: 62.0,
            accuracy: 97.5,
        };
        assert_eq!(typing.primary(), 62.0);
        assert_eq!(typing.accuracy(), Some(97.5));

        let scored = GameMetrics::Scored { score: 81.0 };
        assert_eq!(scored.primary(), 81.0);
        assert_eq!(scored.accuracy(), None);
    }

    #[test]
    fn new_session_generates_id_and_created_at() {
        let session = SessionRecord::new(
            "user-1".to_string(),
            GameKind::Typing,
            Utc::now(),
            Some(Utc::now()),
            60.0,
            GameMetrics::Typing {
                wpm: 40.0,
                accuracy: 90.0,
            },
            vec![],
            None,
        );

        assert!(!session.id.is_empty());
        assert!(session.is_finished());
    }
}
