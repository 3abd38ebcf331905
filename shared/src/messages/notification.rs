//! Notification intents emitted by the engine
//!
//! Each variant carries everything the dispatcher needs to render and
//! deliver the message; the engine never performs delivery itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AssignmentId, BookingId, CleanerId, CustomerId};

/// Intent and payload for the external notification dispatcher
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NotificationIntent {
    /// A new offer was extended to a cleaner and awaits a response
    OfferExtended {
        assignment_id: AssignmentId,
        booking_id: BookingId,
        cleaner_id: CleanerId,
        respond_by: DateTime<Utc>,
    },

    /// The cleaner accepted; the customer should be told who is coming
    OfferAccepted {
        assignment_id: AssignmentId,
        booking_id: BookingId,
        cleaner_id: CleanerId,
        customer_id: CustomerId,
    },

    /// A pending offer lapsed without a response
    OfferExpired {
        assignment_id: AssignmentId,
        booking_id: BookingId,
        cleaner_id: CleanerId,
    },

    /// An accepted cleaner never arrived; rebooking is underway
    NoShowDetected {
        assignment_id: AssignmentId,
        booking_id: BookingId,
        cleaner_id: CleanerId,
        customer_id: CustomerId,
        rematch_started: bool,
    },

    /// The job finished and the booking is closed out
    BookingCompleted {
        assignment_id: AssignmentId,
        booking_id: BookingId,
        cleaner_id: CleanerId,
        customer_id: CustomerId,
    },

    /// The booking was cancelled while an assignment was in flight
    BookingCancelled {
        assignment_id: AssignmentId,
        booking_id: BookingId,
        cleaner_id: CleanerId,
        customer_id: CustomerId,
    },

    /// Automatic matching gave up; an operator must take over
    ManualInterventionRequired {
        booking_id: BookingId,
        failed_offers: u32,
    },
}

impl NotificationIntent {
    /// Booking the intent concerns, for routing and log correlation.
    pub fn booking_id(&self) -> BookingId {
        match self {
            NotificationIntent::OfferExtended { booking_id, .. }
            | NotificationIntent::OfferAccepted { booking_id, .. }
            | NotificationIntent::OfferExpired { booking_id, .. }
            | NotificationIntent::NoShowDetected { booking_id, .. }
            | NotificationIntent::BookingCompleted { booking_id, .. }
            | NotificationIntent::BookingCancelled { booking_id, .. }
            | NotificationIntent::ManualInterventionRequired { booking_id, .. } => *booking_id,
        }
    }

    /// Short label for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationIntent::OfferExtended { .. } => "offer_extended",
            NotificationIntent::OfferAccepted { .. } => "offer_accepted",
            NotificationIntent::OfferExpired { .. } => "offer_expired",
            NotificationIntent::NoShowDetected { .. } => "no_show_detected",
            NotificationIntent::BookingCompleted { .. } => "booking_completed",
            NotificationIntent::BookingCancelled { .. } => "booking_cancelled",
            NotificationIntent::ManualInterventionRequired { .. } => "manual_intervention",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_serialization_roundtrip() {
        let intent = NotificationIntent::ManualInterventionRequired {
            booking_id: BookingId::new(),
            failed_offers: 5,
        };
        let json = serde_json::to_string(&intent).unwrap();
        let back: NotificationIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(intent, back);
    }

    #[test]
    fn booking_id_accessor_covers_all_variants() {
        let booking_id = BookingId::new();
        let intent = NotificationIntent::OfferExpired {
            assignment_id: AssignmentId::new(),
            booking_id,
            cleaner_id: CleanerId::new(),
        };
        assert_eq!(intent.booking_id(), booking_id);
        assert_eq!(intent.kind(), "offer_expired");
    }
}
