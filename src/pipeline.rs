use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::leaderboard::service::LeaderboardService;
use crate::score::service::ScoreService;
use crate::session::models::GameKind;
use crate::session::repository::SessionRepository;
use crate::shared::AppError;
use crate::stats::service::StatsService;

/// The four-stage recompute chain: session history -> GameStat ->
/// ComponentScores -> LeaderboardEntry -> (deferred) global rank. Each
/// stage is a pure function of current state, so the same pipeline runs
/// synchronously on ingest and in batch for reconciliation; there is
/// never a second divergent implementation of any stage.
pub struct ScorePipeline {
    sessions: Arc<dyn SessionRepository>,
    stats: Arc<StatsService>,
    score: Arc<ScoreService>,
    leaderboard: Arc<LeaderboardService>,
}

/// Outcome of a batch reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ReconcileSummary {
    pub users_refreshed: usize,
    pub entries_ranked: usize,
}

impl ScorePipeline {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        stats: Arc<StatsService>,
        score: Arc<ScoreService>,
        leaderboard: Arc<LeaderboardService>,
    ) -> Self {
        Self {
            sessions,
            stats,
            score,
            leaderboard,
        }
    }

    /// Runs the chain for one freshly ingested session. The entry is
    /// left dirty; ranking happens on the next query or batch pass.
    #[instrument(skip(self))]
    pub async fn process_session(&self, user_id: &str, game: GameKind) -> Result<(), AppError> {
        self.stats.recompute(user_id, game).await?;
        self.refresh_user(user_id).await
    }

    /// Recomputes a user's components and leaderboard entry from current
    /// stats and signals. Also the entry point when an external signal
    /// (profile, resume, applications) changes without a new session.
    #[instrument(skip(self))]
    pub async fn refresh_user(&self, user_id: &str) -> Result<(), AppError> {
        let scored = self.score.score_user(user_id).await?;
        let last_activity = self.sessions.latest_activity(user_id).await?;
        self.leaderboard.record_scores(&scored, last_activity).await?;
        Ok(())
    }

    /// Batch reconciliation: recompute every known user's stats and
    /// scores from scratch, then re-rank once. Aggregation is a pure
    /// function of the session set, so this converges regardless of the
    /// order or timing of past events. A failure for one user is logged
    /// and skipped; the pass is retryable.
    #[instrument(skip(self))]
    pub async fn reconcile_all(&self) -> Result<ReconcileSummary, AppError> {
        let mut users: BTreeSet<String> = self.sessions.user_ids().await?.into_iter().collect();
        users.extend(self.leaderboard.user_ids().await?);

        let mut refreshed = 0usize;
        for user_id in &users {
            if let Err(err) = self.reconcile_user(user_id).await {
                warn!(user_id = %user_id, error = %err, "Skipping user during reconciliation");
                continue;
            }
            refreshed += 1;
        }

        let ranked = self.leaderboard.rerank().await?;
        info!(
            users_refreshed = refreshed,
            entries_ranked = ranked,
            "Reconciliation pass complete"
        );
        Ok(ReconcileSummary {
            users_refreshed: refreshed,
            entries_ranked: ranked,
        })
    }

    async fn reconcile_user(&self, user_id: &str) -> Result<(), AppError> {
        for game in self.sessions.games_played(user_id).await? {
            self.stats.recompute(user_id, game).await?;
        }
        self.refresh_user(user_id).await
    }
}
