use serde::{Deserialize, Serialize};
use serde_json::json;

use super::config::{ComponentWeights, ScoringConfig};
use crate::signals::models::{ApplicationStatus, ProfileChecklist, ResumeSignal};
use crate::stats::models::GameStat;

/// One of the five 0-100 sub-scores, with the detail that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub value: f64,
    pub detail: serde_json::Value,
}

impl ComponentScore {
    fn zero(reason: &str) -> Self {
        Self {
            value: 0.0,
            detail: json!({ "reason": reason }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub typing: ComponentScore,
    pub personality: ComponentScore,
    pub profile: ComponentScore,
    pub resume: ComponentScore,
    pub applications: ComponentScore,
}

/// Typing component from the TYPING GameStat: blend of best WPM (speed,
/// saturating at the configured ceiling) and best accuracy. Monotonic
/// non-decreasing in both, bounded to [0, 100]. No stat means 0.
pub fn typing_component(stat: Option<&GameStat>, config: &ScoringConfig) -> ComponentScore {
    let Some(stat) = stat else {
        return ComponentScore::zero("no typing sessions");
    };

    let wpm = stat.best;
    let accuracy = stat.best_accuracy.unwrap_or(0.0);
    let speed_score = (wpm.min(config.typing.wpm_ceiling) / config.typing.wpm_ceiling) * 100.0;
    let value = (config.typing.speed_weight * speed_score
        + config.typing.accuracy_weight * accuracy)
        .clamp(0.0, 100.0);

    ComponentScore {
        value,
        detail: json!({
            "best_wpm": wpm,
            "best_accuracy": accuracy,
            "recent_wpm": stat.recent,
            "speed_score": speed_score,
            "consistency_index": stat.consistency_index,
            "percentile": stat.percentile,
        }),
    }
}

/// Personality component from the PERSONALITY GameStat: completion credit
/// up to the session target plus best confidence. Zero sessions means 0.
pub fn personality_component(stat: Option<&GameStat>, config: &ScoringConfig) -> ComponentScore {
    let Some(stat) = stat else {
        return ComponentScore::zero("no personality sessions");
    };
    if stat.completed_sessions == 0 {
        return ComponentScore::zero("no completed personality sessions");
    }

    let target = config.personality.session_target.max(1);
    let completion = f64::from(stat.completed_sessions.min(target)) / f64::from(target);
    let value = (completion * config.personality.session_points
        + config.personality.confidence_weight * stat.best)
        .clamp(0.0, 100.0);

    ComponentScore {
        value,
        detail: json!({
            "completed_sessions": stat.completed_sessions,
            "best_confidence": stat.best,
            "consistency_index": stat.consistency_index,
        }),
    }
}

/// Profile-completion component: fixed point value per completed checklist
/// field, capped at 100
pub fn profile_component(checklist: &ProfileChecklist, config: &ScoringConfig) -> ComponentScore {
    let mut earned: Vec<&str> = Vec::new();
    let mut missing: Vec<&str> = Vec::new();
    let mut total = 0.0;

    for (field, points) in &config.profile_field_points {
        if checklist.has(field) {
            total += points;
            earned.push(field);
        } else {
            missing.push(field);
        }
    }

    ComponentScore {
        value: total.min(100.0),
        detail: json!({ "completed_fields": earned, "missing_fields": missing }),
    }
}

/// Resume component: flat presence bonus plus the external quality score
/// scaled down. No resume means 0 regardless of any analyzer output.
pub fn resume_component(signal: &ResumeSignal, config: &ScoringConfig) -> ComponentScore {
    if !signal.has_resume {
        return ComponentScore::zero("no resume");
    }

    let quality = signal.quality.unwrap_or(0.0).clamp(0.0, 100.0);
    let value =
        (config.resume.presence_bonus + config.resume.quality_weight * quality).clamp(0.0, 100.0);

    ComponentScore {
        value,
        detail: json!({ "has_resume": true, "quality": quality }),
    }
}

/// Application-activity component: per-application points from the fixed
/// status table, summed and capped at 100
pub fn applications_component(
    statuses: &[ApplicationStatus],
    config: &ScoringConfig,
) -> ComponentScore {
    let total: f64 = statuses
        .iter()
        .map(|status| config.points_for(*status))
        .sum();

    ComponentScore {
        value: total.min(100.0),
        detail: json!({
            "application_count": statuses.len(),
            "uncapped_points": total,
        }),
    }
}

/// Fixed-weight linear combination of the five component values
pub fn overall_score(components: &ComponentScores, weights: &ComponentWeights) -> f64 {
    weights.typing * components.typing.value
        + weights.personality * components.personality.value
        + weights.profile * components.profile.value
        + weights.resume * components.resume.value
        + weights.applications * components.applications.value
}
