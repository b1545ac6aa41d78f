use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument};

use super::models::{LeaderboardEntry, LeaderboardQuery, UserBreakdown};
use super::ranking::rank_entries;
use super::repository::LeaderboardRepository;
use crate::score::service::ScoredUser;
use crate::shared::AppError;

/// Leaderboard Ranker. Owns the per-user entries and the global rank
/// ordering; ranks are a recomputable projection refreshed in full by a
/// bounded batch pass, never patched incrementally from deltas.
pub struct LeaderboardService {
    repository: Arc<dyn LeaderboardRepository>,
    /// Serializes score writes with the global rank pass. A score
    /// recorded between the pass's read and its write-back would
    /// otherwise be clobbered with its dirty flag cleared.
    write_lock: AsyncMutex<()>,
}

impl LeaderboardService {
    pub fn new(repository: Arc<dyn LeaderboardRepository>) -> Self {
        Self {
            repository,
            write_lock: AsyncMutex::new(()),
        }
    }

    /// Stores the freshly computed scores for a user and marks the entry
    /// dirty for the next rank pass. The previous rank is kept in place
    /// so audit reads stay sane; queries re-rank before serving.
    ///
    /// `last_activity_hint` is the latest session timestamp when the
    /// caller knows it; otherwise the previous entry's value is kept, or
    /// the current time for a first-ever (signal-only) entry.
    #[instrument(skip(self, scored))]
    pub async fn record_scores(
        &self,
        scored: &ScoredUser,
        last_activity_hint: Option<DateTime<Utc>>,
    ) -> Result<LeaderboardEntry, AppError> {
        let _guard = self.write_lock.lock().await;

        let previous = self.repository.get(&scored.user_id).await?;
        let last_activity_at = last_activity_hint
            .or(previous.as_ref().map(|p| p.last_activity_at))
            .unwrap_or_else(Utc::now);

        let entry = LeaderboardEntry {
            user_id: scored.user_id.clone(),
            components: scored.components.clone(),
            overall: scored.overall,
            tier: scored.tier,
            rank: previous.as_ref().and_then(|p| p.rank),
            last_activity_at,
            snapshot: json!({
                "overall": scored.overall,
                "tier": scored.tier.to_string(),
                "typing": scored.components.typing.value,
                "personality": scored.components.personality.value,
                "profile": scored.components.profile.value,
                "resume": scored.components.resume.value,
                "applications": scored.components.applications.value,
            }),
            dirty: true,
        };

        self.repository.upsert(&entry).await?;
        debug!(user_id = %entry.user_id, overall = entry.overall, "Recorded scores, entry marked dirty");
        Ok(entry)
    }

    /// Global re-rank: read all entries, assign competition ranks, write
    /// the rank positions back. Bounded and retryable; callers keep it
    /// out of hot paths.
    #[instrument(skip(self))]
    pub async fn rerank(&self) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.repository.all().await?;
        rank_entries(&mut entries);
        self.repository.store_ranked(&entries).await?;

        info!(entries = entries.len(), "Leaderboard re-ranked");
        Ok(entries.len())
    }

    /// Full breakdown for one user. Re-ranks first when any entry is
    /// dirty so the served rank matches the served scores.
    #[instrument(skip(self))]
    pub async fn breakdown(&self, user_id: &str) -> Result<UserBreakdown, AppError> {
        self.ensure_ranked().await?;

        let entry = self
            .repository
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{}' has never been scored", user_id)))?;

        UserBreakdown::from_entry(&entry).ok_or(AppError::Internal)
    }

    /// One ordered leaderboard page, re-ranked first if stale
    #[instrument(skip(self))]
    pub async fn page(&self, query: &LeaderboardQuery) -> Result<Vec<LeaderboardEntry>, AppError> {
        self.ensure_ranked().await?;
        self.repository.page(query).await
    }

    /// Entries matching the query's filters, ignoring pagination
    pub async fn total(&self, query: &LeaderboardQuery) -> Result<usize, AppError> {
        self.repository.count(query).await
    }

    pub async fn user_ids(&self) -> Result<Vec<String>, AppError> {
        self.repository.user_ids().await
    }

    async fn ensure_ranked(&self) -> Result<(), AppError> {
        if self.repository.any_dirty().await? {
            self.rerank().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::repository::InMemoryLeaderboardRepository;
    use crate::score::components::{ComponentScore, ComponentScores};
    use crate::score::config::Tier;

    fn scored(user_id: &str, overall: f64) -> ScoredUser {
        let score = ComponentScore {
            value: overall,
            detail: json!({}),
        };
        ScoredUser {
            user_id: user_id.to_string(),
            components: ComponentScores {
                typing: score.clone(),
                personality: score.clone(),
                profile: score.clone(),
                resume: score.clone(),
                applications: score,
            },
            overall,
            tier: Tier::Bronze,
        }
    }

    fn service() -> LeaderboardService {
        LeaderboardService::new(Arc::new(InMemoryLeaderboardRepository::new()))
    }

    #[tokio::test]
    async fn breakdown_for_unknown_user_is_not_found() {
        let service = service();
        let result = service.breakdown("ghost").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn zero_score_user_is_present_not_missing() {
        let service = service();
        service
            .record_scores(&scored("alice", 0.0), Some(Utc::now()))
            .await
            .unwrap();

        let breakdown = service.breakdown("alice").await.unwrap();
        assert_eq!(breakdown.overall, 0.0);
        assert_eq!(breakdown.rank, 1);
    }

    #[tokio::test]
    async fn breakdown_rank_matches_latest_scores() {
        let service = service();
        service
            .record_scores(&scored("alice", 50.0), Some(Utc::now()))
            .await
            .unwrap();
        service
            .record_scores(&scored("bob", 80.0), Some(Utc::now()))
            .await
            .unwrap();

        assert_eq!(service.breakdown("alice").await.unwrap().rank, 2);

        // Alice overtakes; a stale cached rank must not be served
        service
            .record_scores(&scored("alice", 95.0), Some(Utc::now()))
            .await
            .unwrap();
        assert_eq!(service.breakdown("alice").await.unwrap().rank, 1);
        assert_eq!(service.breakdown("bob").await.unwrap().rank, 2);
    }

    #[tokio::test]
    async fn tied_users_share_rank_and_next_skips() {
        let service = service();
        for (user, overall) in [("alice", 72.5), ("bob", 72.5), ("carol", 60.0)] {
            service
                .record_scores(&scored(user, overall), Some(Utc::now()))
                .await
                .unwrap();
        }

        assert_eq!(service.breakdown("alice").await.unwrap().rank, 1);
        assert_eq!(service.breakdown("bob").await.unwrap().rank, 1);
        assert_eq!(service.breakdown("carol").await.unwrap().rank, 3);
    }

    #[tokio::test]
    async fn page_serves_rank_order() {
        let service = service();
        for (user, overall) in [("alice", 50.0), ("bob", 80.0), ("carol", 65.0)] {
            service
                .record_scores(&scored(user, overall), Some(Utc::now()))
                .await
                .unwrap();
        }

        let page = service.page(&LeaderboardQuery::default()).await.unwrap();
        let order: Vec<&str> = page.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, vec!["bob", "carol", "alice"]);
    }
}
