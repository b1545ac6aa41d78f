use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, instrument};

use super::aggregate::compute_game_stat;
use super::errors::StatsError;
use super::models::GameStat;
use super::repository::StatsRepository;
use crate::session::models::GameKind;
use crate::session::repository::SessionRepository;

/// Per-Game Aggregator. Recomputes a user's GameStat from their full
/// session history plus the population of other users' best values.
pub struct StatsService {
    repository: Arc<dyn StatsRepository>,
    sessions: Arc<dyn SessionRepository>,
    /// Serializes recomputes per (user, game). Two concurrent recomputes
    /// for the same key would race read-then-write; the later lock holder
    /// re-reads the full session set, so the superset result wins.
    recompute_locks: Arc<RwLock<HashMap<(String, GameKind), Arc<AsyncMutex<()>>>>>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn StatsRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            sessions,
            recompute_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Recomputes and stores the stat for (user, game). Returns None when
    /// the user has no finished sessions for the game.
    #[instrument(skip(self))]
    pub async fn recompute(
        &self,
        user_id: &str,
        game: GameKind,
    ) -> Result<Option<GameStat>, StatsError> {
        let lock = self.recompute_lock(user_id, game).await;
        let _guard = lock.lock().await;

        let history = self.sessions.list_for_user(user_id, game).await?;
        let population = self.repository.population_best(game).await?;

        let Some(stat) = compute_game_stat(user_id, game, &history, &population) else {
            debug!(user_id, game = %game, "No finished sessions; stat stays absent");
            return Ok(None);
        };

        self.repository.upsert(&stat).await?;
        debug!(
            user_id,
            game = %game,
            best = stat.best,
            percentile = stat.percentile,
            "Recomputed game stat"
        );
        Ok(Some(stat))
    }

    pub async fn get_stat(
        &self,
        user_id: &str,
        game: GameKind,
    ) -> Result<Option<GameStat>, StatsError> {
        self.repository.get(user_id, game).await
    }

    async fn recompute_lock(&self, user_id: &str, game: GameKind) -> Arc<AsyncMutex<()>> {
        let key = (user_id.to_string(), game);
        {
            let guard = self.recompute_locks.read().await;
            if let Some(lock) = guard.get(&key) {
                return lock.clone();
            }
        }

        let mut guard = self.recompute_locks.write().await;
        guard
            .entry(key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
