//! Engine-specific error types

use shared::{Actor, AssignmentId, AssignmentStatus, BookingId, BookingStatus, CleanerId, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid state for assignment {assignment_id}: expected {expected}, found {actual}")]
    InvalidState {
        assignment_id: AssignmentId,
        expected: String,
        actual: AssignmentStatus,
    },

    #[error("Actor {actor} may not perform this operation: {detail}")]
    Forbidden { actor: Actor, detail: String },

    #[error("Booking {booking_id} already has an active assignment")]
    BookingAlreadyClaimed { booking_id: BookingId },

    #[error("No eligible candidates for booking {booking_id}")]
    NoCandidatesAvailable { booking_id: BookingId },

    #[error("Invalid configuration: {detail}")]
    ConfigInvalid { detail: String },

    #[error("Deadline not reached for assignment {assignment_id}")]
    DeadlineNotReached { assignment_id: AssignmentId },

    #[error("Booking {booking_id} is {actual}, expected {expected}")]
    BookingStateConflict {
        booking_id: BookingId,
        expected: BookingStatus,
        actual: BookingStatus,
    },

    #[error("Booking not found: {booking_id}")]
    BookingNotFound { booking_id: BookingId },

    #[error("Cleaner not found: {cleaner_id}")]
    CleanerNotFound { cleaner_id: CleanerId },

    #[error("Assignment not found: {assignment_id}")]
    AssignmentNotFound { assignment_id: AssignmentId },

    #[error("Storage failure: {detail}")]
    Storage { detail: String },

    #[error("Shared component error")]
    Shared(#[from] SharedError),
}

pub type EngineResult<T> = Result<T, EngineError>;
