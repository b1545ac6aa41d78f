use std::sync::Arc;

use tracing::{debug, instrument};

use super::components::{
    applications_component, overall_score, personality_component, profile_component,
    resume_component, typing_component, ComponentScores,
};
use super::config::{ScoringConfig, Tier};
use crate::session::models::GameKind;
use crate::shared::AppError;
use crate::signals::provider::SignalProvider;
use crate::stats::repository::StatsRepository;

/// The five components plus their weighted composition for one user
#[derive(Debug, Clone)]
pub struct ScoredUser {
    pub user_id: String,
    pub components: ComponentScores,
    pub overall: f64,
    pub tier: Tier,
}

/// Composite Score Calculator. Combines the typing and personality game
/// stats with the external profile, resume and application signals into
/// one weighted overall score and a tier.
pub struct ScoreService {
    config: ScoringConfig,
    stats: Arc<dyn StatsRepository>,
    signals: Arc<dyn SignalProvider>,
}

impl ScoreService {
    pub fn new(
        config: ScoringConfig,
        stats: Arc<dyn StatsRepository>,
        signals: Arc<dyn SignalProvider>,
    ) -> Self {
        Self {
            config,
            stats,
            signals,
        }
    }

    /// Computes all five components and the composite for a user. A
    /// missing input zeroes its component; the computation never aborts
    /// because one collaborator has nothing for this user.
    #[instrument(skip(self))]
    pub async fn score_user(&self, user_id: &str) -> Result<ScoredUser, AppError> {
        let typing_stat = self.stats.get(user_id, GameKind::Typing).await?;
        let personality_stat = self.stats.get(user_id, GameKind::Personality).await?;
        let checklist = self.signals.profile_checklist(user_id).await?;
        let resume = self.signals.resume_signal(user_id).await?;
        let applications = self.signals.application_statuses(user_id).await?;

        let components = ComponentScores {
            typing: typing_component(typing_stat.as_ref(), &self.config),
            personality: personality_component(personality_stat.as_ref(), &self.config),
            profile: profile_component(&checklist, &self.config),
            resume: resume_component(&resume, &self.config),
            applications: applications_component(&applications, &self.config),
        };

        let overall = overall_score(&components, &self.config.weights);
        let tier = self.config.tier_for(overall);

        debug!(user_id, overall, tier = %tier, "Scored user");

        Ok(ScoredUser {
            user_id: user_id.to_string(),
            components,
            overall,
            tier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::models::{ApplicationStatus, ProfileChecklist, ResumeSignal};
    use crate::signals::provider::InMemorySignalProvider;
    use crate::stats::models::GameStat;
    use crate::stats::repository::InMemoryStatsRepository;
    use chrono::Utc;
    use serde_json::json;

    fn service() -> (
        ScoreService,
        Arc<InMemoryStatsRepository>,
        Arc<InMemorySignalProvider>,
    ) {
        let stats = Arc::new(InMemoryStatsRepository::new());
        let signals = Arc::new(InMemorySignalProvider::new());
        (
            ScoreService::new(ScoringConfig::default(), stats.clone(), signals.clone()),
            stats,
            signals,
        )
    }

    fn stat(game: GameKind, best: f64, accuracy: Option<f64>, completed: u32) -> GameStat {
        GameStat {
            user_id: "alice".to_string(),
            game,
            total_sessions: completed,
            completed_sessions: completed,
            last_played_at: Utc::now(),
            best,
            best_achieved_at: Utc::now(),
            best_accuracy: accuracy,
            recent: best,
            recent_accuracy: accuracy,
            median: Some(best),
            consistency_index: 80.0,
            percentile: 60.0,
            snapshot: json!({}),
        }
    }

    #[tokio::test]
    async fn user_with_no_inputs_scores_zero_everywhere() {
        let (service, _, _) = service();
        let scored = service.score_user("nobody").await.unwrap();
        assert_eq!(scored.overall, 0.0);
        assert_eq!(scored.tier, Tier::Bronze);
        assert_eq!(scored.components.typing.value, 0.0);
        assert_eq!(scored.components.resume.value, 0.0);
    }

    #[tokio::test]
    async fn profile_only_user_scores_exactly_the_profile_weight() {
        let (service, _, signals) = service();
        let config = ScoringConfig::default();
        signals.set_profile(
            "alice",
            ProfileChecklist::with_fields(
                config.profile_field_points.iter().map(|(f, _)| f.clone()),
            ),
        );

        let scored = service.score_user("alice").await.unwrap();
        assert_eq!(scored.components.profile.value, 100.0);
        assert!((scored.overall - config.weights.profile * 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn all_components_feed_the_composite() {
        let (service, stats, signals) = service();
        stats.insert_raw(stat(GameKind::Typing, 90.0, Some(96.0), 5));
        stats.insert_raw(stat(GameKind::Personality, 85.0, None, 3));
        signals.set_profile("alice", ProfileChecklist::with_fields(["headline", "skills"]));
        signals.set_resume(
            "alice",
            ResumeSignal {
                has_resume: true,
                quality: Some(80.0),
            },
        );
        signals.set_applications("alice", vec![ApplicationStatus::Interview]);

        let scored = service.score_user("alice").await.unwrap();
        assert!(scored.components.typing.value > 0.0);
        assert!(scored.components.personality.value > 0.0);
        assert_eq!(scored.components.profile.value, 25.0);
        assert_eq!(scored.components.resume.value, 84.0);
        assert_eq!(scored.components.applications.value, 25.0);
        assert!(scored.overall > 0.0 && scored.overall <= 100.0);
    }

    #[tokio::test]
    async fn scoring_is_deterministic_for_fixed_inputs() {
        let (service, stats, _) = service();
        stats.insert_raw(stat(GameKind::Typing, 45.0, Some(95.0), 3));

        let first = service.score_user("alice").await.unwrap();
        let second = service.score_user("alice").await.unwrap();
        assert_eq!(first.overall, second.overall);
        assert_eq!(first.tier, second.tier);
        assert_eq!(first.components, second.components);
    }
}
