//! Assignment lifecycle rules
//!
//! The transition rules are pure: given a snapshot of the assignment (and
//! where relevant its booking), an acting party and the current time, each
//! `plan_*` function either refuses the transition or produces a guard and
//! an update. The store applies guard and update in a single transaction,
//! so a stale snapshot can never cause a double transition — the guard
//! fails and nothing is written.
//!
//! States: PENDING → ACCEPTED → COMPLETED, with PENDING → REJECTED,
//! PENDING → EXPIRED, ACCEPTED → NO_SHOW, and any non-terminal state →
//! CANCELLED. Check-in is a recorded timestamp on ACCEPTED, not a state.

use chrono::{DateTime, Duration, Utc};
use shared::{Actor, Assignment, AssignmentStatus, Booking};

use crate::error::{EngineError, EngineResult};

/// Precondition evaluated atomically with an update
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionGuard {
    /// Current status must be one of these.
    pub expected_any_of: Vec<AssignmentStatus>,
    /// When set, the presence of a check-in timestamp must match.
    pub checked_in: Option<bool>,
}

impl TransitionGuard {
    pub fn status(expected: AssignmentStatus) -> Self {
        Self {
            expected_any_of: vec![expected],
            checked_in: None,
        }
    }

    pub fn status_with_checkin(expected: AssignmentStatus, checked_in: bool) -> Self {
        Self {
            expected_any_of: vec![expected],
            checked_in: Some(checked_in),
        }
    }

    /// Any state the cancel operation may start from.
    pub fn any_active() -> Self {
        Self {
            expected_any_of: vec![AssignmentStatus::Pending, AssignmentStatus::Accepted],
            checked_in: None,
        }
    }

    /// Does this guard admit the assignment in its current state?
    pub fn admits(&self, assignment: &Assignment) -> bool {
        if !self.expected_any_of.contains(&assignment.status) {
            return false;
        }
        match self.checked_in {
            Some(required) => assignment.checked_in_at.is_some() == required,
            None => true,
        }
    }

    /// Human-readable expectation, used in `InvalidState` errors.
    pub fn describe(&self) -> String {
        let states = self
            .expected_any_of
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        match self.checked_in {
            Some(true) => format!("{states} with check-in recorded"),
            Some(false) => format!("{states} without check-in"),
            None => states,
        }
    }
}

/// Field deltas applied when a guard admits the transition
///
/// `None` fields are left untouched by the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssignmentUpdate {
    pub status: Option<AssignmentStatus>,
    pub responded_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

/// A guard/update pair ready for the store to apply atomically
pub type PlannedTransition = (TransitionGuard, AssignmentUpdate);

/// Cleaner accepts a pending offer.
pub fn plan_accept(
    assignment: &Assignment,
    actor: Actor,
    now: DateTime<Utc>,
) -> EngineResult<PlannedTransition> {
    require_offer_owner(assignment, actor)?;
    Ok((
        TransitionGuard::status(AssignmentStatus::Pending),
        AssignmentUpdate {
            status: Some(AssignmentStatus::Accepted),
            responded_at: Some(now),
            accepted_at: Some(now),
            ..Default::default()
        },
    ))
}

/// Cleaner declines a pending offer.
pub fn plan_reject(
    assignment: &Assignment,
    actor: Actor,
    now: DateTime<Utc>,
) -> EngineResult<PlannedTransition> {
    require_offer_owner(assignment, actor)?;
    Ok((
        TransitionGuard::status(AssignmentStatus::Pending),
        AssignmentUpdate {
            status: Some(AssignmentStatus::Rejected),
            responded_at: Some(now),
            rejected_at: Some(now),
            ..Default::default()
        },
    ))
}

/// System expires a pending offer whose response deadline has passed.
pub fn plan_expire(
    assignment: &Assignment,
    now: DateTime<Utc>,
    offer_timeout: Duration,
) -> EngineResult<PlannedTransition> {
    if now < assignment.offered_at + offer_timeout {
        return Err(EngineError::DeadlineNotReached {
            assignment_id: assignment.id,
        });
    }
    Ok((
        TransitionGuard::status(AssignmentStatus::Pending),
        AssignmentUpdate {
            status: Some(AssignmentStatus::Expired),
            ..Default::default()
        },
    ))
}

/// Cleaner records arrival on site. No status change; the timestamp gates
/// no-show detection.
pub fn plan_check_in(
    assignment: &Assignment,
    actor: Actor,
    now: DateTime<Utc>,
) -> EngineResult<PlannedTransition> {
    require_offer_owner(assignment, actor)?;
    Ok((
        TransitionGuard::status_with_checkin(AssignmentStatus::Accepted, false),
        AssignmentUpdate {
            checked_in_at: Some(now),
            ..Default::default()
        },
    ))
}

/// System marks an accepted assignment as a no-show once the grace window
/// after the scheduled start has elapsed without a check-in.
pub fn plan_no_show(
    assignment: &Assignment,
    booking: &Booking,
    now: DateTime<Utc>,
    grace: Duration,
) -> EngineResult<PlannedTransition> {
    if now < booking.scheduled_start + grace {
        return Err(EngineError::DeadlineNotReached {
            assignment_id: assignment.id,
        });
    }
    Ok((
        TransitionGuard::status_with_checkin(AssignmentStatus::Accepted, false),
        AssignmentUpdate {
            status: Some(AssignmentStatus::NoShow),
            ..Default::default()
        },
    ))
}

/// Cleaner completes a job they checked in for.
pub fn plan_complete(
    assignment: &Assignment,
    actor: Actor,
    now: DateTime<Utc>,
) -> EngineResult<PlannedTransition> {
    require_offer_owner(assignment, actor)?;
    Ok((
        TransitionGuard::status_with_checkin(AssignmentStatus::Accepted, true),
        AssignmentUpdate {
            status: Some(AssignmentStatus::Completed),
            completed_at: Some(now),
            ..Default::default()
        },
    ))
}

/// Cancel an in-flight assignment, typically because the booking itself
/// was cancelled.
pub fn plan_cancel(
    assignment: &Assignment,
    booking: &Booking,
    actor: Actor,
) -> EngineResult<PlannedTransition> {
    if !actor.may_cancel(booking) {
        return Err(EngineError::Forbidden {
            actor,
            detail: format!("cancel booking {}", booking.id),
        });
    }
    debug_assert_eq!(assignment.booking_id, booking.id);
    Ok((
        TransitionGuard::any_active(),
        AssignmentUpdate {
            status: Some(AssignmentStatus::Cancelled),
            ..Default::default()
        },
    ))
}

fn require_offer_owner(assignment: &Assignment, actor: Actor) -> EngineResult<()> {
    if !actor.may_act_for_cleaner(assignment.cleaner_id) {
        return Err(EngineError::Forbidden {
            actor,
            detail: format!("assignment {} belongs to another cleaner", assignment.id),
        });
    }
    Ok(())
}

/// Apply an update to an assignment snapshot. The store calls this inside
/// its transaction after the guard has admitted the current state.
pub fn apply_update(assignment: &mut Assignment, update: &AssignmentUpdate) {
    if let Some(status) = update.status {
        assignment.status = status;
    }
    if let Some(t) = update.responded_at {
        assignment.responded_at = Some(t);
    }
    if let Some(t) = update.accepted_at {
        assignment.accepted_at = Some(t);
    }
    if let Some(t) = update.checked_in_at {
        assignment.checked_in_at = Some(t);
    }
    if let Some(t) = update.completed_at {
        assignment.completed_at = Some(t);
    }
    if let Some(t) = update.rejected_at {
        assignment.rejected_at = Some(t);
    }
}
