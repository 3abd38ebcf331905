//! Trait definitions with mockall annotations for testing
//!
//! Every external collaborator of the engine sits behind one of these
//! traits: the persistent store, the clock, the notification dispatcher
//! and the scoring-weights source. The engine is generic over all four,
//! which keeps unit tests fast and lets the binary choose real
//! implementations.

use chrono::{DateTime, Utc};

use shared::{
    AlgorithmWeights, Assignment, AssignmentId, Booking, BookingId, BookingStatus, CleanerId,
    CleanerProfile, NotificationIntent,
};

use crate::core::state_machine::{AssignmentUpdate, TransitionGuard};
use crate::error::EngineResult;

/// Persistent store abstraction for bookings, cleaners and assignments
///
/// Transition methods are transactional: the precondition is evaluated
/// and the mutation applied in one isolated step, so racing callers can
/// never both succeed. `offer_assignment` performs its active-assignment
/// existence check and the insert in the same transaction, which is what
/// enforces the at-most-one-active-assignment invariant.
#[mockall::automock]
#[async_trait::async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Fetch a booking by id
    async fn booking(&self, id: BookingId) -> EngineResult<Booking>;

    /// All bookings currently in OPEN state
    async fn open_bookings(&self) -> EngineResult<Vec<Booking>>;

    /// Compare-and-set the booking status; fails with
    /// `BookingStateConflict` when the current status is not `from`
    async fn transition_booking(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> EngineResult<Booking>;

    /// Mark a booking as needing operator attention
    async fn flag_booking_attention(&self, id: BookingId) -> EngineResult<Booking>;

    /// Fetch a cleaner profile by id
    async fn cleaner(&self, id: CleanerId) -> EngineResult<CleanerProfile>;

    /// All cleaners whose active flag is set
    async fn eligible_cleaners(&self) -> EngineResult<Vec<CleanerProfile>>;

    /// Bookings this cleaner currently holds an active assignment for,
    /// used to detect scheduling conflicts
    async fn cleaner_commitments(&self, id: CleanerId) -> EngineResult<Vec<Booking>>;

    /// Feed one offer response (accepted or not) into the cleaner's
    /// rolling acceptance statistic; offer expiry counts as a non-response
    async fn record_offer_response(&self, id: CleanerId, accepted: bool) -> EngineResult<()>;

    /// Feed one punctuality sample into the cleaner's rolling on-time
    /// statistic
    async fn record_punctuality(&self, id: CleanerId, on_time: bool) -> EngineResult<()>;

    /// Fetch an assignment by id
    async fn assignment(&self, id: AssignmentId) -> EngineResult<Assignment>;

    /// Full assignment history of a booking, any state
    async fn assignments_for_booking(&self, id: BookingId) -> EngineResult<Vec<Assignment>>;

    /// Insert a new PENDING assignment iff the booking has no active
    /// assignment; fails with `BookingAlreadyClaimed` otherwise
    async fn offer_assignment(&self, assignment: Assignment) -> EngineResult<Assignment>;

    /// Apply `update` iff `guard` admits the current record; fails with
    /// `InvalidState` (and writes nothing) otherwise
    async fn transition_assignment(
        &self,
        id: AssignmentId,
        guard: TransitionGuard,
        update: AssignmentUpdate,
    ) -> EngineResult<Assignment>;

    /// PENDING assignments offered at or before `cutoff`
    async fn pending_offered_before(&self, cutoff: DateTime<Utc>) -> EngineResult<Vec<Assignment>>;

    /// ACCEPTED assignments without a check-in whose booking was scheduled
    /// to start at or before `cutoff`
    async fn accepted_awaiting_checkin_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> EngineResult<Vec<Assignment>>;
}

/// Time source abstraction
///
/// Deadlines are always computed from stored timestamps compared against
/// this clock, never from in-process timers, so decisions survive process
/// restarts and tests can pin time.
#[mockall::automock]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Notification dispatch abstraction
///
/// The engine emits intents; delivery is someone else's job.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, intent: NotificationIntent) -> EngineResult<()>;
}

/// Source of the current scoring weights
///
/// Readers take a snapshot per match; updates validate the sum invariant
/// before becoming visible and leave the prior value authoritative when
/// rejected.
#[mockall::automock]
#[async_trait::async_trait]
pub trait WeightsSource: Send + Sync {
    async fn snapshot(&self) -> AlgorithmWeights;

    async fn update(&self, weights: AlgorithmWeights) -> EngineResult<AlgorithmWeights>;
}
