//! In-memory store implementation
//!
//! Every operation takes the single store lock for its whole duration,
//! which gives each trait method the atomic, isolated semantics the
//! engine's compare-and-set transitions rely on. A database-backed
//! implementation would provide the same guarantees with row-level
//! transactions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use shared::{
    Assignment, AssignmentId, Booking, BookingId, BookingStatus, CleanerId, CleanerProfile,
};

use crate::core::state_machine::{apply_update, AssignmentUpdate, TransitionGuard};
use crate::error::{EngineError, EngineResult};
use crate::traits::AssignmentStore;

/// Pseudo-count backing a profile's seeded rate, so one new sample nudges
/// rather than overwrites it.
const STAT_PRIOR_WEIGHT: f64 = 20.0;

#[derive(Default)]
struct Inner {
    bookings: HashMap<BookingId, Booking>,
    cleaners: HashMap<CleanerId, CleanerProfile>,
    assignments: HashMap<AssignmentId, Assignment>,
    response_samples: HashMap<CleanerId, u64>,
    punctuality_samples: HashMap<CleanerId, u64>,
}

impl Inner {
    fn active_assignment_for(&self, booking_id: BookingId) -> Option<&Assignment> {
        self.assignments
            .values()
            .find(|a| a.booking_id == booking_id && a.is_active())
    }
}

/// Shared in-memory store; clones operate on the same data
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_booking(&self, booking: Booking) {
        self.inner.lock().await.bookings.insert(booking.id, booking);
    }

    pub async fn insert_cleaner(&self, cleaner: CleanerProfile) {
        self.inner.lock().await.cleaners.insert(cleaner.id, cleaner);
    }
}

#[async_trait::async_trait]
impl AssignmentStore for InMemoryStore {
    async fn booking(&self, id: BookingId) -> EngineResult<Booking> {
        self.inner
            .lock()
            .await
            .bookings
            .get(&id)
            .cloned()
            .ok_or(EngineError::BookingNotFound { booking_id: id })
    }

    async fn open_bookings(&self) -> EngineResult<Vec<Booking>> {
        Ok(self
            .inner
            .lock()
            .await
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Open)
            .cloned()
            .collect())
    }

    async fn transition_booking(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> EngineResult<Booking> {
        let mut inner = self.inner.lock().await;
        let booking = inner
            .bookings
            .get_mut(&id)
            .ok_or(EngineError::BookingNotFound { booking_id: id })?;
        if booking.status != from {
            return Err(EngineError::BookingStateConflict {
                booking_id: id,
                expected: from,
                actual: booking.status,
            });
        }
        booking.status = to;
        Ok(booking.clone())
    }

    async fn flag_booking_attention(&self, id: BookingId) -> EngineResult<Booking> {
        let mut inner = self.inner.lock().await;
        let booking = inner
            .bookings
            .get_mut(&id)
            .ok_or(EngineError::BookingNotFound { booking_id: id })?;
        booking.needs_attention = true;
        Ok(booking.clone())
    }

    async fn cleaner(&self, id: CleanerId) -> EngineResult<CleanerProfile> {
        self.inner
            .lock()
            .await
            .cleaners
            .get(&id)
            .cloned()
            .ok_or(EngineError::CleanerNotFound { cleaner_id: id })
    }

    async fn eligible_cleaners(&self) -> EngineResult<Vec<CleanerProfile>> {
        Ok(self
            .inner
            .lock()
            .await
            .cleaners
            .values()
            .filter(|c| c.active)
            .cloned()
            .collect())
    }

    async fn cleaner_commitments(&self, id: CleanerId) -> EngineResult<Vec<Booking>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .assignments
            .values()
            .filter(|a| a.cleaner_id == id && a.is_active())
            .filter_map(|a| inner.bookings.get(&a.booking_id))
            .cloned()
            .collect())
    }

    async fn record_offer_response(&self, id: CleanerId, accepted: bool) -> EngineResult<()> {
        let mut inner = self.inner.lock().await;
        let samples = *inner.response_samples.get(&id).unwrap_or(&0);
        let cleaner = inner
            .cleaners
            .get_mut(&id)
            .ok_or(EngineError::CleanerNotFound { cleaner_id: id })?;
        cleaner.acceptance_rate = roll_rate(cleaner.acceptance_rate, samples, accepted);
        inner.response_samples.insert(id, samples + 1);
        Ok(())
    }

    async fn record_punctuality(&self, id: CleanerId, on_time: bool) -> EngineResult<()> {
        let mut inner = self.inner.lock().await;
        let samples = *inner.punctuality_samples.get(&id).unwrap_or(&0);
        let cleaner = inner
            .cleaners
            .get_mut(&id)
            .ok_or(EngineError::CleanerNotFound { cleaner_id: id })?;
        cleaner.punctuality_rate = roll_rate(cleaner.punctuality_rate, samples, on_time);
        inner.punctuality_samples.insert(id, samples + 1);
        Ok(())
    }

    async fn assignment(&self, id: AssignmentId) -> EngineResult<Assignment> {
        self.inner
            .lock()
            .await
            .assignments
            .get(&id)
            .cloned()
            .ok_or(EngineError::AssignmentNotFound { assignment_id: id })
    }

    async fn assignments_for_booking(&self, id: BookingId) -> EngineResult<Vec<Assignment>> {
        Ok(self
            .inner
            .lock()
            .await
            .assignments
            .values()
            .filter(|a| a.booking_id == id)
            .cloned()
            .collect())
    }

    async fn offer_assignment(&self, assignment: Assignment) -> EngineResult<Assignment> {
        let mut inner = self.inner.lock().await;
        if !inner.bookings.contains_key(&assignment.booking_id) {
            return Err(EngineError::BookingNotFound {
                booking_id: assignment.booking_id,
            });
        }
        if inner.active_assignment_for(assignment.booking_id).is_some() {
            return Err(EngineError::BookingAlreadyClaimed {
                booking_id: assignment.booking_id,
            });
        }
        inner.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn transition_assignment(
        &self,
        id: AssignmentId,
        guard: TransitionGuard,
        update: AssignmentUpdate,
    ) -> EngineResult<Assignment> {
        let mut inner = self.inner.lock().await;
        let assignment = inner
            .assignments
            .get_mut(&id)
            .ok_or(EngineError::AssignmentNotFound { assignment_id: id })?;
        if !guard.admits(assignment) {
            return Err(EngineError::InvalidState {
                assignment_id: id,
                expected: guard.describe(),
                actual: assignment.status,
            });
        }
        apply_update(assignment, &update);
        Ok(assignment.clone())
    }

    async fn pending_offered_before(&self, cutoff: DateTime<Utc>) -> EngineResult<Vec<Assignment>> {
        Ok(self
            .inner
            .lock()
            .await
            .assignments
            .values()
            .filter(|a| a.status == shared::AssignmentStatus::Pending && a.offered_at <= cutoff)
            .cloned()
            .collect())
    }

    async fn accepted_awaiting_checkin_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> EngineResult<Vec<Assignment>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .assignments
            .values()
            .filter(|a| a.status == shared::AssignmentStatus::Accepted && a.checked_in_at.is_none())
            .filter(|a| {
                inner
                    .bookings
                    .get(&a.booking_id)
                    .is_some_and(|b| b.scheduled_start <= cutoff)
            })
            .cloned()
            .collect())
    }
}

/// Fold one boolean sample into a rolling rate, damped by the prior the
/// seeded rate represents.
fn roll_rate(rate: f64, recorded_samples: u64, sample: bool) -> f64 {
    let n = STAT_PRIOR_WEIGHT + recorded_samples as f64;
    let value = if sample { 1.0 } else { 0.0 };
    ((rate * n) + value) / (n + 1.0)
}
