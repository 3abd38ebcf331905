//! Candidate selection and ranking
//!
//! Filters the cleaner pool down to genuine candidates for a booking and
//! orders them by score. The ordering is fully deterministic: score
//! descending, then median response latency ascending, then cleaner id.

use std::collections::HashSet;

use shared::{AlgorithmWeights, Booking, CleanerId, CleanerProfile};

use super::scoring::score;

/// A candidate cleaner together with their computed score
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    pub cleaner: CleanerProfile,
    pub score: f64,
}

/// An ordered ranking of candidates for one booking
///
/// Iteration yields candidates best-first; callers take the top-N they
/// need and may restart iteration at any time.
#[derive(Clone, Debug, Default)]
pub struct RankedCandidates {
    ranked: Vec<ScoredCandidate>,
}

impl RankedCandidates {
    /// Best-ranked candidate, if any survived filtering.
    pub fn top(&self) -> Option<&ScoredCandidate> {
        self.ranked.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredCandidate> {
        self.ranked.iter()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

impl IntoIterator for RankedCandidates {
    type Item = ScoredCandidate;
    type IntoIter = std::vec::IntoIter<ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranked.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedCandidates {
    type Item = &'a ScoredCandidate;
    type IntoIter = std::slice::Iter<'a, ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranked.iter()
    }
}

/// Rank the eligible candidates for `booking`.
///
/// Filters applied, in order: active flag, booking within the cleaner's
/// service radius, not in `excluded` (cleaners who already failed this
/// booking), not in `conflicted` (cleaners committed elsewhere at the
/// scheduled time). Survivors are scored with the supplied weights
/// snapshot.
pub fn rank_candidates(
    booking: &Booking,
    pool: Vec<CleanerProfile>,
    excluded: &HashSet<CleanerId>,
    conflicted: &HashSet<CleanerId>,
    weights: &AlgorithmWeights,
) -> RankedCandidates {
    let mut ranked: Vec<ScoredCandidate> = pool
        .into_iter()
        .filter(|c| c.active)
        .filter(|c| c.position.distance_km(&booking.location) <= c.service_radius_km)
        .filter(|c| !excluded.contains(&c.id))
        .filter(|c| !conflicted.contains(&c.id))
        .map(|cleaner| {
            let score = score(&cleaner, booking, weights);
            ScoredCandidate { cleaner, score }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.cleaner.median_response_secs.cmp(&b.cleaner.median_response_secs))
            .then_with(|| a.cleaner.id.cmp(&b.cleaner.id))
    });

    RankedCandidates { ranked }
}
