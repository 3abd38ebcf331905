//! Shared types for the booking dispatch system
//!
//! Contains only types that cross a component boundary: domain records
//! read and written through the persistent store, identifiers, and the
//! notification intents handed to the external dispatcher. Engine-internal
//! types (ranking, sweep outcomes) live in the engine crate.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

// Re-export the dispatcher-facing message surface
pub use messages::NotificationIntent;
