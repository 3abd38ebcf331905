//! Core domain types used throughout the dispatch system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{SharedError, SharedResult};

/// Unique identifier for a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a cleaner
///
/// Ordered so deterministic tie-breaking in candidate ranking can fall
/// back to the identifier as the final key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CleanerId(Uuid);

impl CleanerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for CleanerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CleanerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a customer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an assignment (one offer of a booking to a cleaner)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A geographic position in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another point in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

/// Lifecycle status of a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Open,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Open => write!(f, "OPEN"),
            BookingStatus::Assigned => write!(f, "ASSIGNED"),
            BookingStatus::InProgress => write!(f, "IN_PROGRESS"),
            BookingStatus::Completed => write!(f, "COMPLETED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Service requirements attached to a booking
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub addons: Vec<String>,
}

/// A scheduled cleaning job requested by a customer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub scheduled_start: DateTime<Utc>,
    pub location: GeoPoint,
    pub details: ServiceDetails,
    pub status: BookingStatus,
    /// Set when automatic matching has given up and an operator must step in.
    pub needs_attention: bool,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        customer_id: CustomerId,
        scheduled_start: DateTime<Utc>,
        location: GeoPoint,
        details: ServiceDetails,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            customer_id,
            scheduled_start,
            location,
            details,
            status: BookingStatus::Open,
            needs_attention: false,
            created_at,
        }
    }
}

/// A service provider eligible to be matched to bookings
///
/// The rolling statistics (rating, acceptance, punctuality, response
/// latency) are maintained by the store's aggregation hooks; the engine
/// only reads them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanerProfile {
    pub id: CleanerId,
    pub name: String,
    /// Rolling average rating in [0, 5]
    pub rating: f64,
    /// Historical share of offers accepted, in [0, 1]
    pub acceptance_rate: f64,
    /// Historical share of accepted jobs arrived on time, in [0, 1]
    pub punctuality_rate: f64,
    pub position: GeoPoint,
    /// Maximum distance the cleaner serves, in kilometres
    pub service_radius_km: f64,
    pub active: bool,
    /// Median time to respond to an offer; ranking tie-break
    pub median_response_secs: u64,
}

/// Lifecycle status of an assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Completed,
    Rejected,
    Expired,
    NoShow,
    Cancelled,
}

impl AssignmentStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::Completed
                | AssignmentStatus::Rejected
                | AssignmentStatus::Expired
                | AssignmentStatus::NoShow
                | AssignmentStatus::Cancelled
        )
    }

    /// Active states count against the one-active-assignment-per-booking
    /// invariant.
    pub fn is_active(&self) -> bool {
        matches!(self, AssignmentStatus::Pending | AssignmentStatus::Accepted)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentStatus::Pending => write!(f, "PENDING"),
            AssignmentStatus::Accepted => write!(f, "ACCEPTED"),
            AssignmentStatus::Completed => write!(f, "COMPLETED"),
            AssignmentStatus::Rejected => write!(f, "REJECTED"),
            AssignmentStatus::Expired => write!(f, "EXPIRED"),
            AssignmentStatus::NoShow => write!(f, "NO_SHOW"),
            AssignmentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// The record of one offer of a booking to one cleaner and its lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub booking_id: BookingId,
    pub cleaner_id: CleanerId,
    pub status: AssignmentStatus,
    pub offered_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// A fresh PENDING offer of `booking_id` to `cleaner_id`.
    pub fn new_offer(booking_id: BookingId, cleaner_id: CleanerId, now: DateTime<Utc>) -> Self {
        Self {
            id: AssignmentId::new(),
            booking_id,
            cleaner_id,
            status: AssignmentStatus::Pending,
            offered_at: now,
            responded_at: None,
            accepted_at: None,
            checked_in_at: None,
            completed_at: None,
            rejected_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Allowed deviation of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Coefficients controlling the relative importance of scoring factors
///
/// Each weight lies in [0, 1] and the four must sum to 1.0 within
/// [`WEIGHT_SUM_TOLERANCE`]. Updates go through a validated admin path;
/// an invalid set is never stored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmWeights {
    pub rating: f64,
    pub distance: f64,
    pub acceptance: f64,
    pub punctuality: f64,
}

impl Default for AlgorithmWeights {
    fn default() -> Self {
        Self {
            rating: 0.4,
            distance: 0.3,
            acceptance: 0.2,
            punctuality: 0.1,
        }
    }
}

impl AlgorithmWeights {
    pub fn sum(&self) -> f64 {
        self.rating + self.distance + self.acceptance + self.punctuality
    }

    /// Check the range and sum invariants.
    pub fn validate(&self) -> SharedResult<()> {
        let components = [
            ("rating", self.rating),
            ("distance", self.distance),
            ("acceptance", self.acceptance),
            ("punctuality", self.punctuality),
        ];
        for (field, value) in components {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(SharedError::InvalidConfig {
                    field: format!("weights.{field}"),
                    value: value.to_string(),
                });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SharedError::InvalidConfig {
                field: "weights".to_string(),
                value: format!("sum {sum:.3}, expected 1.0 ± {WEIGHT_SUM_TOLERANCE}"),
            });
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Who is invoking a transition
///
/// Capability checks take the actor explicitly; nothing is inferred from
/// ambient session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Cleaner(CleanerId),
    Customer(CustomerId),
    Admin,
    System,
}

impl Actor {
    /// May this actor respond to an offer held by `cleaner_id`?
    pub fn may_act_for_cleaner(&self, cleaner_id: CleanerId) -> bool {
        match self {
            Actor::Cleaner(id) => *id == cleaner_id,
            Actor::Admin => true,
            _ => false,
        }
    }

    /// May this actor cancel `booking`?
    pub fn may_cancel(&self, booking: &Booking) -> bool {
        match self {
            Actor::Customer(id) => *id == booking.customer_id,
            Actor::Admin | Actor::System => true,
            Actor::Cleaner(_) => false,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Cleaner(id) => write!(f, "cleaner:{id}"),
            Actor::Customer(id) => write!(f, "customer:{id}"),
            Actor::Admin => write!(f, "admin"),
            Actor::System => write!(f, "system"),
        }
    }
}
