//! Leaderboard ranking helpers.
//!
//! Pure functions over learner XP totals. The total order is XP
//! descending, then earliest achiever of that XP, then id, so repeated
//! queries over unchanged data always produce the same ranking.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One unranked leaderboard row.
#[derive(Debug, Clone)]
pub struct ScoreRow<I> {
    pub user_id: I,
    pub total_xp: i64,
    /// When the learner last reached this XP total; earlier wins ties.
    pub xp_updated_at: DateTime<Utc>,
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry<I> {
    pub user_id: I,
    pub total_xp: i64,
    pub rank: u32,
}

/// A learner whose rank improved between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankMover<I> {
    pub user_id: I,
    pub rank_before: u32,
    pub rank_now: u32,
    pub places_gained: u32,
}

/// Assign 1-based ranks over the deterministic total order.
pub fn rank_entries<I>(mut rows: Vec<ScoreRow<I>>) -> Vec<RankEntry<I>>
where
    I: Ord + Clone,
{
    rows.sort_by(|a, b| {
        b.total_xp
            .cmp(&a.total_xp)
            .then_with(|| a.xp_updated_at.cmp(&b.xp_updated_at))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| RankEntry {
            user_id: row.user_id,
            total_xp: row.total_xp,
            rank: (i + 1) as u32,
        })
        .collect()
}

/// The `window` ranks immediately above and below a learner, inclusive.
///
/// Returns an empty slice when the learner is not ranked at all.
pub fn around_me<I>(ranked: &[RankEntry<I>], user_id: &I, window: usize) -> Vec<RankEntry<I>>
where
    I: Eq + Clone,
{
    let Some(pos) = ranked.iter().position(|e| &e.user_id == user_id) else {
        return Vec::new();
    };

    let start = pos.saturating_sub(window);
    let end = (pos + window + 1).min(ranked.len());
    ranked[start..end].to_vec()
}

/// Learners with the largest positive rank improvement between a
/// previous snapshot and the current ranking.
///
/// Learners absent from the snapshot (new arrivals) are skipped; only
/// strictly positive swings count as movement.
pub fn top_movers<I>(
    current: &[RankEntry<I>],
    previous: &[RankEntry<I>],
    n: usize,
) -> Vec<RankMover<I>>
where
    I: Eq + Hash + Ord + Clone,
{
    let before: HashMap<&I, u32> = previous.iter().map(|e| (&e.user_id, e.rank)).collect();

    let mut movers: Vec<RankMover<I>> = current
        .iter()
        .filter_map(|entry| {
            let rank_before = *before.get(&entry.user_id)?;
            if rank_before > entry.rank {
                Some(RankMover {
                    user_id: entry.user_id.clone(),
                    rank_before,
                    rank_now: entry.rank,
                    places_gained: rank_before - entry.rank,
                })
            } else {
                None
            }
        })
        .collect();

    movers.sort_by(|a, b| {
        b.places_gained
            .cmp(&a.places_gained)
            .then_with(|| a.rank_now.cmp(&b.rank_now))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    movers.truncate(n);
    movers
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    fn row(id: u32, xp: i64, hour: u32) -> ScoreRow<u32> {
        ScoreRow { user_id: id, total_xp: xp, xp_updated_at: at(hour) }
    }

    #[test]
    fn ranks_by_xp_descending() {
        let ranked = rank_entries(vec![row(1, 100, 0), row(2, 300, 0), row(3, 200, 0)]);
        let order: Vec<u32> = ranked.iter().map(|e| e.user_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn ties_break_by_earliest_then_id() {
        let ranked = rank_entries(vec![row(5, 200, 9), row(2, 200, 8), row(1, 200, 9)]);
        let order: Vec<u32> = ranked.iter().map(|e| e.user_id).collect();
        assert_eq!(order, vec![2, 1, 5]);
    }

    #[test]
    fn ranking_is_stable_across_invocations() {
        let rows = vec![row(1, 200, 3), row(2, 200, 3), row(3, 50, 1)];
        let first = rank_entries(rows.clone());
        let second = rank_entries(rows);
        assert_eq!(first, second);
    }

    #[test]
    fn around_me_slices_inclusive_window() {
        let ranked = rank_entries((1..=9).map(|i| row(i, 1000 - i as i64 * 10, 0)).collect());
        let window = around_me(&ranked, &5, 2);
        let ids: Vec<u32> = window.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn around_me_clamps_at_edges() {
        let ranked = rank_entries((1..=4).map(|i| row(i, 100 - i as i64, 0)).collect());
        let window = around_me(&ranked, &1, 2);
        let ids: Vec<u32> = window.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn around_me_unknown_user_is_empty() {
        let ranked = rank_entries(vec![row(1, 10, 0)]);
        assert!(around_me(&ranked, &99, 3).is_empty());
    }

    #[test]
    fn movers_require_positive_swing() {
        let previous = rank_entries(vec![row(1, 300, 0), row(2, 200, 0), row(3, 100, 0)]);
        // User 3 jumps to the top; user 1 falls.
        let current = rank_entries(vec![row(1, 300, 0), row(2, 200, 0), row(3, 500, 1)]);
        let movers = top_movers(&current, &previous, 5);
        assert_eq!(movers.len(), 1);
        assert_eq!(movers[0].user_id, 3);
        assert_eq!(movers[0].places_gained, 2);
    }

    #[test]
    fn movers_skip_learners_without_snapshot() {
        let previous = rank_entries(vec![row(1, 300, 0)]);
        let current = rank_entries(vec![row(1, 300, 0), row(2, 400, 1)]);
        assert!(top_movers(&current, &previous, 5).is_empty());
    }
}
