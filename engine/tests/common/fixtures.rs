//! Test fixtures and data for engine tests
//!
//! Provides consistent bookings, cleaner profiles and weights across the
//! test suites.

use chrono::{DateTime, Utc};

use shared::{
    AlgorithmWeights, Booking, CleanerId, CleanerProfile, CustomerId, GeoPoint, ServiceDetails,
};

/// Standard test data and builders
pub struct TestFixtures;

impl TestFixtures {
    /// Job site all fixture bookings and cleaners are placed around
    pub const SITE: GeoPoint = GeoPoint {
        lat: 40.7128,
        lon: -74.0060,
    };

    /// Default service radius generous enough that every fixture cleaner
    /// covers the site
    pub const RADIUS_KM: f64 = 15.0;

    /// An OPEN booking scheduled at `scheduled_start`.
    pub fn booking_at(scheduled_start: DateTime<Utc>) -> Booking {
        Booking::new(
            CustomerId::new(),
            scheduled_start,
            Self::SITE,
            ServiceDetails {
                bedrooms: 2,
                bathrooms: 1,
                addons: Vec::new(),
            },
            scheduled_start - chrono::Duration::days(1),
        )
    }

    /// A cleaner at the job site whose rating alone distinguishes them.
    pub fn cleaner(name: &str, rating: f64) -> CleanerProfile {
        Self::cleaner_with(name, rating, 1.0, 1.0, 120)
    }

    pub fn cleaner_with(
        name: &str,
        rating: f64,
        acceptance: f64,
        punctuality: f64,
        response_secs: u64,
    ) -> CleanerProfile {
        CleanerProfile {
            id: CleanerId::new(),
            name: name.to_string(),
            rating,
            acceptance_rate: acceptance,
            punctuality_rate: punctuality,
            position: Self::SITE,
            service_radius_km: Self::RADIUS_KM,
            active: true,
            median_response_secs: response_secs,
        }
    }

    /// Weights making the score exactly rating / 5, so tests can dial in
    /// target scores like 0.9 / 0.7 / 0.5 via ratings 4.5 / 3.5 / 2.5.
    pub fn rating_only_weights() -> AlgorithmWeights {
        AlgorithmWeights {
            rating: 1.0,
            distance: 0.0,
            acceptance: 0.0,
            punctuality: 0.0,
        }
    }
}
