//! Service-specific tests
//!
//! Exercises the store's transactional primitives directly; engine-level
//! behavior is covered by the crate's integration suite.


/// Common builders for service tests
pub mod common {
    use chrono::{DateTime, Utc};
    use shared::{Booking, CleanerId, CleanerProfile, CustomerId, GeoPoint, ServiceDetails};

    pub const SITE: GeoPoint = GeoPoint {
        lat: 40.7128,
        lon: -74.0060,
    };

    pub fn booking_at(scheduled_start: DateTime<Utc>) -> Booking {
        Booking::new(
            CustomerId::new(),
            scheduled_start,
            SITE,
            ServiceDetails::default(),
            Utc::now(),
        )
    }

    pub fn cleaner(rating: f64) -> CleanerProfile {
        CleanerProfile {
            id: CleanerId::new(),
            name: "Test Cleaner".to_string(),
            rating,
            acceptance_rate: 0.9,
            punctuality_rate: 0.9,
            position: SITE,
            service_radius_km: 10.0,
            active: true,
            median_response_secs: 120,
        }
    }
}
