//! Service implementations
//!
//! Concrete implementations of the engine's collaborator traits: the
//! in-memory store, clocks, notifiers, the shared weights source and the
//! periodic sweeper that drives recovery.

pub mod clock;
pub mod memory_store;
pub mod notifier;
pub mod sweeper;
pub mod weights;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use clock::{FixedClock, SystemClock};
pub use memory_store::InMemoryStore;
pub use notifier::{ChannelNotifier, TracingNotifier};
pub use sweeper::Sweeper;
pub use weights::SharedWeights;
