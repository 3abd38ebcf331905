//! Pure domain logic: scoring, candidate ranking, and transition rules
//!
//! Nothing here performs I/O; the engine composes these with the injected
//! store, clock and notifier.

pub mod scoring;
pub mod selector;
pub mod state_machine;

pub use scoring::{distance_subscore, score};
pub use selector::{rank_candidates, RankedCandidates, ScoredCandidate};
pub use state_machine::{
    apply_update, plan_accept, plan_cancel, plan_check_in, plan_complete, plan_expire,
    plan_no_show, plan_reject, AssignmentUpdate, PlannedTransition, TransitionGuard,
};
