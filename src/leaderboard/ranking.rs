use std::cmp::Ordering;

use super::models::LeaderboardEntry;

/// Orders entries and assigns standard competition ranks in place.
///
/// Sort order: overall score descending, then earlier last activity, then
/// user id, so exact ties still get a total order for pagination
/// stability. Entries with identical overall scores share a rank and the
/// next distinct score's rank skips by the size of the tie group.
pub fn rank_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(compare);

    let mut previous_score: Option<f64> = None;
    let mut current_rank = 0u32;
    for (position, entry) in entries.iter_mut().enumerate() {
        let tied = previous_score.is_some_and(|score| score == entry.overall);
        if !tied {
            current_rank = position as u32 + 1;
        }
        previous_score = Some(entry.overall);
        entry.rank = Some(current_rank);
        entry.dirty = false;
    }
}

fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.overall
        .partial_cmp(&a.overall)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.last_activity_at.cmp(&b.last_activity_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}
