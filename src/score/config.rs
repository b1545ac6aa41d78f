use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::signals::models::ApplicationStatus;

/// Named score band the overall score falls into, lower-bound inclusive
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

/// Fixed weights of the five components. Must sum to 1.0 so overall
/// scores stay comparable over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub typing: f64,
    pub personality: f64,
    pub profile: f64,
    pub resume: f64,
    pub applications: f64,
}

impl ComponentWeights {
    pub fn sum(&self) -> f64 {
        self.typing + self.personality + self.profile + self.resume + self.applications
    }
}

/// Typing component curve: speed saturates at wpm_ceiling, then blends
/// with accuracy. Monotonic non-decreasing in both inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingCurve {
    pub wpm_ceiling: f64,
    pub speed_weight: f64,
    pub accuracy_weight: f64,
}

/// Personality component: credit for completing sessions up to a target,
/// plus the best confidence value scaled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityCurve {
    pub session_target: u32,
    pub session_points: f64,
    pub confidence_weight: f64,
}

/// Resume component: flat bonus for having any resume at all, plus the
/// external quality score scaled down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePolicy {
    pub presence_bonus: f64,
    pub quality_weight: f64,
}

/// All composite-score policy in one auditable structure. The formulas in
/// the component calculators only read constants from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ComponentWeights,
    pub typing: TypingCurve,
    pub personality: PersonalityCurve,
    pub profile_field_points: Vec<(String, f64)>,
    pub resume: ResumePolicy,
    pub application_points: Vec<(ApplicationStatus, f64)>,
    /// Lower bounds, ascending. A score below the first bound is Bronze.
    pub tier_bands: Vec<(Tier, f64)>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("component weights sum to {0}, expected 1.0")]
    BadWeights(f64),
    #[error("tier bands must be ascending by lower bound")]
    UnorderedTiers,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ConfigError::BadWeights(sum));
        }
        let ordered = self
            .tier_bands
            .windows(2)
            .all(|pair| pair[0].1 <= pair[1].1);
        if !ordered {
            return Err(ConfigError::UnorderedTiers);
        }
        Ok(())
    }

    pub fn points_for(&self, status: ApplicationStatus) -> f64 {
        self.application_points
            .iter()
            .find(|(candidate, _)| *candidate == status)
            .map(|(_, points)| *points)
            .unwrap_or(0.0)
    }

    pub fn tier_for(&self, overall: f64) -> Tier {
        let mut tier = Tier::Bronze;
        for (candidate, lower_bound) in &self.tier_bands {
            if overall >= *lower_bound {
                tier = *candidate;
            }
        }
        tier
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ComponentWeights {
                typing: 0.30,
                personality: 0.20,
                profile: 0.20,
                resume: 0.15,
                applications: 0.15,
            },
            typing: TypingCurve {
                wpm_ceiling: 150.0,
                speed_weight: 0.55,
                accuracy_weight: 0.45,
            },
            personality: PersonalityCurve {
                session_target: 3,
                session_points: 40.0,
                confidence_weight: 0.6,
            },
            profile_field_points: vec![
                ("headline".to_string(), 10.0),
                ("summary".to_string(), 15.0),
                ("skills".to_string(), 15.0),
                ("experience".to_string(), 20.0),
                ("education".to_string(), 10.0),
                ("location".to_string(), 5.0),
                ("photo".to_string(), 10.0),
                ("links".to_string(), 15.0),
            ],
            resume: ResumePolicy {
                presence_bonus: 20.0,
                quality_weight: 0.8,
            },
            application_points: vec![
                (ApplicationStatus::Submitted, 5.0),
                (ApplicationStatus::Reviewing, 10.0),
                (ApplicationStatus::Interview, 25.0),
                (ApplicationStatus::Offer, 60.0),
                (ApplicationStatus::Hired, 100.0),
            ],
            tier_bands: vec![
                (Tier::Bronze, 0.0),
                (Tier::Silver, 40.0),
                (Tier::Gold, 60.0),
                (Tier::Platinum, 75.0),
                (Tier::Diamond, 90.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_is_valid() {
        ScoringConfig::default().validate().unwrap();
    }

    #[test]
    fn default_profile_points_sum_to_100() {
        let total: f64 = ScoringConfig::default()
            .profile_field_points
            .iter()
            .map(|(_, points)| points)
            .sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn skewed_weights_are_rejected() {
        let mut config = ScoringConfig::default();
        config.weights.typing = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadWeights(_))
        ));
    }

    #[test]
    fn unordered_tier_bands_are_rejected() {
        let mut config = ScoringConfig::default();
        config.tier_bands.swap(1, 3);
        assert!(matches!(config.validate(), Err(ConfigError::UnorderedTiers)));
    }

    #[rstest]
    #[case(0.0, Tier::Bronze)]
    #[case(39.9, Tier::Bronze)]
    #[case(40.0, Tier::Silver)]
    #[case(60.0, Tier::Gold)]
    #[case(75.0, Tier::Platinum)]
    #[case(90.0, Tier::Diamond)]
    #[case(100.0, Tier::Diamond)]
    fn tier_bands_are_lower_bound_inclusive(#[case] score: f64, #[case] expected: Tier) {
        assert_eq!(ScoringConfig::default().tier_for(score), expected);
    }

    #[test]
    fn unknown_application_status_scores_zero_points() {
        let mut config = ScoringConfig::default();
        config.application_points.clear();
        assert_eq!(config.points_for(ApplicationStatus::Hired), 0.0);
    }
}
