//! Weighted candidate scoring
//!
//! Pure functions only; everything the score depends on is passed in, so
//! the same inputs always produce the same ranking.

use shared::{AlgorithmWeights, Booking, CleanerProfile};

/// Maximum rating a cleaner profile can carry.
const RATING_SCALE: f64 = 5.0;

/// Score a candidate cleaner for a booking, in [0, 1].
///
/// The result is a weighted sum of four normalized sub-scores: rating,
/// proximity, historical acceptance and historical punctuality. Returns
/// 0.0 when the weights fail the sum invariant; config validation is
/// supposed to reject such a set before it ever reaches this point.
pub fn score(cleaner: &CleanerProfile, booking: &Booking, weights: &AlgorithmWeights) -> f64 {
    if !weights.is_valid() {
        return 0.0;
    }

    let rating = unit_clamp(cleaner.rating / RATING_SCALE);
    let distance = distance_subscore(
        cleaner.position.distance_km(&booking.location),
        cleaner.service_radius_km,
    );
    let acceptance = unit_clamp(cleaner.acceptance_rate);
    let punctuality = unit_clamp(cleaner.punctuality_rate);

    let total = weights.rating * rating
        + weights.distance * distance
        + weights.acceptance * acceptance
        + weights.punctuality * punctuality;

    unit_clamp(total)
}

/// Proximity sub-score: linear falloff from 1.0 at the cleaner's position
/// to 0.0 at the edge of their service radius, and 0.0 beyond it.
///
/// Candidates beyond the radius are excluded by the selector; the zero
/// here is a floor, not the exclusion mechanism.
pub fn distance_subscore(distance_km: f64, service_radius_km: f64) -> f64 {
    if service_radius_km <= 0.0 || !distance_km.is_finite() {
        return 0.0;
    }
    unit_clamp(1.0 - distance_km / service_radius_km)
}

fn unit_clamp(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
