use serde_json::json;
use tracing::warn;

use super::models::{GameStat, PopulationBest};
use crate::session::models::{GameKind, MetricDirection, SessionRecord};

/// Neutral consistency for a user with a single finished session. A lone
/// attempt says nothing about stability, so it gets neither 0 nor 100.
pub const CONSISTENCY_NEUTRAL: f64 = 50.0;

const EPSILON: f64 = 1e-9;

/// Recomputes the full GameStat for one user and game from that user's
/// session history plus the population of other users' best values.
/// Returns None when the user has no finished sessions for the game; an
/// absent stat is distinct from a stat of zero.
pub fn compute_game_stat(
    user_id: &str,
    game: GameKind,
    sessions: &[SessionRecord],
    population: &[PopulationBest],
) -> Option<GameStat> {
    let finished: Vec<&SessionRecord> = sessions.iter().filter(|s| s.is_finished()).collect();
    if finished.is_empty() {
        return None;
    }

    let direction = game.metric_direction();
    let best_session = best_of(direction, &finished)?;
    let recent_session = finished
        .iter()
        .max_by_key(|s| (s.finished_at, s.created_at))?;

    let best = best_session.metrics.primary();
    let best_accuracy = finished
        .iter()
        .filter_map(|s| s.metrics.accuracy())
        .max_by(|a, b| a.total_cmp(b));
    let recent = recent_session.metrics.primary();
    let completed_sessions = finished.len() as u32;

    let consistency_index = if completed_sessions == 1 {
        CONSISTENCY_NEUTRAL
    } else {
        consistency(best, recent)
    };

    let percentile = percentile_rank(direction, user_id, best, population);
    let median = median_primary(&finished);
    let last_played_at = sessions.iter().map(|s| s.created_at).max()?;

    let snapshot = json!({
        "game": game.to_string(),
        "best": best,
        "recent": recent,
        "median": median,
        "total_sessions": sessions.len(),
        "completed_sessions": completed_sessions,
        "population_size": population.len(),
    });

    Some(GameStat {
        user_id: user_id.to_string(),
        game,
        total_sessions: sessions.len() as u32,
        completed_sessions,
        last_played_at,
        best,
        best_achieved_at: best_session.created_at,
        best_accuracy,
        recent,
        recent_accuracy: recent_session.metrics.accuracy(),
        median,
        consistency_index,
        percentile,
        snapshot,
    })
}

/// The session holding the best primary metric. Chronological iteration
/// with strict comparison keeps the earliest session on exact ties.
fn best_of<'a>(
    direction: MetricDirection,
    finished: &[&'a SessionRecord],
) -> Option<&'a SessionRecord> {
    let mut ordered: Vec<&SessionRecord> = finished.to_vec();
    ordered.sort_by_key(|s| s.created_at);

    let mut best: Option<&SessionRecord> = None;
    for session in ordered {
        let value = session.metrics.primary();
        let better = match best {
            None => true,
            Some(current) => match direction {
                MetricDirection::HigherIsBetter => value > current.metrics.primary(),
                MetricDirection::LowerIsBetter => value < current.metrics.primary(),
            },
        };
        if better {
            best = Some(session);
        }
    }
    best
}

/// 0-100 score for how close recent performance sits to best
fn consistency(best: f64, recent: f64) -> f64 {
    let scale = best.abs().max(EPSILON);
    let raw = 100.0 * (1.0 - (best - recent).abs() / scale);
    raw.clamp(0.0, 100.0)
}

/// Fraction of the rest of the population whose best is no better than
/// this user's, expressed 0-100. A corrupt population row is skipped and
/// logged, never fatal to the requesting user's computation.
fn percentile_rank(
    direction: MetricDirection,
    user_id: &str,
    own_best: f64,
    population: &[PopulationBest],
) -> f64 {
    let mut others = 0u32;
    let mut no_better = 0u32;

    for entry in population {
        if entry.user_id == user_id {
            continue;
        }
        if !entry.best.is_finite() {
            warn!(
                user_id = %entry.user_id,
                best = entry.best,
                "Skipping corrupt population entry during percentile scan"
            );
            continue;
        }
        others += 1;
        let is_no_better = match direction {
            MetricDirection::HigherIsBetter => entry.best <= own_best,
            MetricDirection::LowerIsBetter => entry.best >= own_best,
        };
        if is_no_better {
            no_better += 1;
        }
    }

    if others == 0 {
        // Nobody to compare against; the only competitor is at the top.
        return 100.0;
    }
    100.0 * f64::from(no_better) / f64::from(others)
}

fn median_primary(finished: &[&SessionRecord]) -> Option<f64> {
    if finished.is_empty() {
        return None;
    }
    let mut values: Vec<f64> = finished.iter().map(|s| s.metrics.primary()).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
