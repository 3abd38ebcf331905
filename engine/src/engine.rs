//! Match orchestration
//!
//! `Engine` owns the full assignment lifecycle: it creates offers from
//! ranked candidates, applies transition operations through the store's
//! atomic guard/update primitive, and recovers from rejections, expired
//! offers and no-shows by re-invoking matching. The periodic sweeper and
//! the request-triggered operations are both thin callers of the same
//! core, so the one-active-assignment-per-booking invariant is enforced
//! in exactly one place.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use shared::{
    Actor, AlgorithmWeights, Assignment, AssignmentId, AssignmentStatus, Booking, BookingId,
    BookingStatus, CleanerId, NotificationIntent,
};

use crate::config::EngineConfig;
use crate::core::selector::rank_candidates;
use crate::core::state_machine::{
    plan_accept, plan_cancel, plan_check_in, plan_complete, plan_expire, plan_no_show, plan_reject,
};
use crate::error::{EngineError, EngineResult};
use crate::traits::{AssignmentStore, Clock, Notifier, WeightsSource};

/// Result of one matching attempt for a booking
#[derive(Clone, Debug)]
pub enum MatchOutcome {
    /// A new PENDING offer was created for the top-ranked candidate
    Offered(Assignment),
    /// No eligible candidate survived filtering; the booking stays OPEN
    /// and is retried on the next scheduling pass
    NoCandidates,
    /// The bounded retry budget is exhausted; the booking is flagged for
    /// an operator and no longer retried automatically
    AttentionFlagged { failed_offers: u32 },
}

/// Compact re-match result carried inside sweep outcomes
#[derive(Clone, Debug, PartialEq)]
pub enum RematchSummary {
    Offered(AssignmentId),
    NoCandidates,
    AttentionFlagged,
    Failed(String),
}

impl From<&MatchOutcome> for RematchSummary {
    fn from(outcome: &MatchOutcome) -> Self {
        match outcome {
            MatchOutcome::Offered(a) => RematchSummary::Offered(a.id),
            MatchOutcome::NoCandidates => RematchSummary::NoCandidates,
            MatchOutcome::AttentionFlagged { .. } => RematchSummary::AttentionFlagged,
        }
    }
}

/// What happened to one assignment during a recovery pass
#[derive(Clone, Debug, PartialEq)]
pub enum SweepResult {
    /// Marked NO_SHOW; `rematch` says what happened to the booking next
    NoShowMarked { rematch: RematchSummary },
    /// Pending offer lapsed; `rematch` says what happened next
    OfferExpired { rematch: RematchSummary },
    /// Already transitioned by a racing actor; nothing to do
    Skipped,
    /// Processing failed; other items were unaffected
    Failed { detail: String },
}

/// Per-assignment outcome record returned by `sweep`
#[derive(Clone, Debug)]
pub struct SweepOutcome {
    pub assignment_id: AssignmentId,
    pub booking_id: BookingId,
    pub previous_cleaner_id: CleanerId,
    pub result: SweepResult,
}

/// Everything one periodic recovery pass did
#[derive(Clone, Debug, Default)]
pub struct RecoveryReport {
    pub expired: Vec<SweepOutcome>,
    pub no_shows: Vec<SweepOutcome>,
    pub rematched: Vec<(BookingId, RematchSummary)>,
}

impl RecoveryReport {
    pub fn is_quiet(&self) -> bool {
        self.expired.is_empty() && self.no_shows.is_empty() && self.rematched.is_empty()
    }
}

/// The assignment and matching engine, generic over its collaborators
pub struct Engine<S, C, N, W>
where
    S: AssignmentStore + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    W: WeightsSource + Send + Sync + 'static,
{
    store: S,
    clock: C,
    notifier: N,
    weights: W,
    config: EngineConfig,
}

impl<S, C, N, W> Engine<S, C, N, W>
where
    S: AssignmentStore + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    W: WeightsSource + Send + Sync + 'static,
{
    /// Create a new engine with injected dependencies.
    pub fn new(store: S, clock: C, notifier: N, weights: W, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            notifier,
            weights,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current scoring weights snapshot.
    pub async fn current_weights(&self) -> AlgorithmWeights {
        self.weights.snapshot().await
    }

    /// Administrative weights update; rejected sets leave the previous
    /// weights active.
    pub async fn update_weights(&self, weights: AlgorithmWeights) -> EngineResult<AlgorithmWeights> {
        let applied = self.weights.update(weights).await?;
        info!(
            rating = applied.rating,
            distance = applied.distance,
            acceptance = applied.acceptance,
            punctuality = applied.punctuality,
            "Scoring weights updated"
        );
        Ok(applied)
    }

    /// Offer `booking_id` to the best available candidate.
    ///
    /// Returns `BookingAlreadyClaimed` when an active assignment exists —
    /// callers racing against another matcher treat that as losing the
    /// race, not as a fault.
    pub async fn match_booking(&self, booking_id: BookingId) -> EngineResult<MatchOutcome> {
        let booking = self.store.booking(booking_id).await?;
        if booking.status != BookingStatus::Open {
            return Err(EngineError::BookingStateConflict {
                booking_id,
                expected: BookingStatus::Open,
                actual: booking.status,
            });
        }

        let history = self.store.assignments_for_booking(booking_id).await?;
        if let Some(active) = history.iter().find(|a| a.is_active()) {
            debug!(booking_id = %booking_id, assignment_id = %active.id, "Booking already claimed");
            return Err(EngineError::BookingAlreadyClaimed { booking_id });
        }

        let excluded: HashSet<CleanerId> = history
            .iter()
            .filter(|a| failed_offer(a.status))
            .map(|a| a.cleaner_id)
            .collect();
        let failed_offers = history.iter().filter(|a| failed_offer(a.status)).count() as u32;

        if booking.needs_attention || failed_offers >= self.config.max_offer_attempts {
            if !booking.needs_attention {
                self.store.flag_booking_attention(booking_id).await?;
                warn!(
                    booking_id = %booking_id,
                    failed_offers,
                    "Offer budget exhausted, flagging booking for manual intervention"
                );
                self.notify(NotificationIntent::ManualInterventionRequired {
                    booking_id,
                    failed_offers,
                })
                .await;
            }
            return Ok(MatchOutcome::AttentionFlagged { failed_offers });
        }

        let pool = self.store.eligible_cleaners().await?;
        let conflicted = self.conflicted_cleaners(&booking, &pool, &excluded).await?;
        let weights = self.weights.snapshot().await;
        let ranked = rank_candidates(&booking, pool, &excluded, &conflicted, &weights);

        let top = match ranked.top() {
            Some(candidate) => candidate,
            None => {
                info!(booking_id = %booking_id, "No eligible candidates, booking stays open");
                return Ok(MatchOutcome::NoCandidates);
            }
        };

        let now = self.clock.now();
        let offer = Assignment::new_offer(booking_id, top.cleaner.id, now);
        let stored = self.store.offer_assignment(offer).await?;

        info!(
            booking_id = %booking_id,
            assignment_id = %stored.id,
            cleaner_id = %stored.cleaner_id,
            score = top.score,
            "Offer extended"
        );
        self.notify(NotificationIntent::OfferExtended {
            assignment_id: stored.id,
            booking_id,
            cleaner_id: stored.cleaner_id,
            respond_by: now + self.config.offer_timeout(),
        })
        .await;

        Ok(MatchOutcome::Offered(stored))
    }

    /// Cleaner accepts a pending offer; the booking becomes ASSIGNED.
    pub async fn accept(&self, assignment_id: AssignmentId, actor: Actor) -> EngineResult<Assignment> {
        let assignment = self.store.assignment(assignment_id).await?;
        let (guard, update) = plan_accept(&assignment, actor, self.clock.now())?;
        let accepted = self
            .store
            .transition_assignment(assignment_id, guard, update)
            .await?;

        let booking = self
            .store
            .transition_booking(accepted.booking_id, BookingStatus::Open, BookingStatus::Assigned)
            .await?;
        self.store
            .record_offer_response(accepted.cleaner_id, true)
            .await?;

        info!(
            assignment_id = %assignment_id,
            booking_id = %accepted.booking_id,
            cleaner_id = %accepted.cleaner_id,
            "Offer accepted"
        );
        self.notify(NotificationIntent::OfferAccepted {
            assignment_id,
            booking_id: accepted.booking_id,
            cleaner_id: accepted.cleaner_id,
            customer_id: booking.customer_id,
        })
        .await;

        Ok(accepted)
    }

    /// Cleaner declines a pending offer; matching immediately retries
    /// with the next-best candidate.
    pub async fn reject(
        &self,
        assignment_id: AssignmentId,
        actor: Actor,
    ) -> EngineResult<(Assignment, MatchOutcome)> {
        let assignment = self.store.assignment(assignment_id).await?;
        let (guard, update) = plan_reject(&assignment, actor, self.clock.now())?;
        let rejected = self
            .store
            .transition_assignment(assignment_id, guard, update)
            .await?;
        self.store
            .record_offer_response(rejected.cleaner_id, false)
            .await?;

        info!(
            assignment_id = %assignment_id,
            booking_id = %rejected.booking_id,
            cleaner_id = %rejected.cleaner_id,
            "Offer rejected, re-matching"
        );
        let rematch = self.match_booking(rejected.booking_id).await?;
        Ok((rejected, rematch))
    }

    /// Expire a pending offer whose response deadline has passed. Counts
    /// as a non-response in the cleaner's acceptance statistic.
    pub async fn expire(
        &self,
        assignment_id: AssignmentId,
    ) -> EngineResult<(Assignment, MatchOutcome)> {
        self.expire_at(assignment_id, self.clock.now()).await
    }

    async fn expire_at(
        &self,
        assignment_id: AssignmentId,
        now: DateTime<Utc>,
    ) -> EngineResult<(Assignment, MatchOutcome)> {
        let assignment = self.store.assignment(assignment_id).await?;
        let (guard, update) = plan_expire(&assignment, now, self.config.offer_timeout())?;
        let expired = self
            .store
            .transition_assignment(assignment_id, guard, update)
            .await?;
        self.store
            .record_offer_response(expired.cleaner_id, false)
            .await?;

        info!(
            assignment_id = %assignment_id,
            booking_id = %expired.booking_id,
            cleaner_id = %expired.cleaner_id,
            "Offer expired without response, re-matching"
        );
        self.notify(NotificationIntent::OfferExpired {
            assignment_id,
            booking_id: expired.booking_id,
            cleaner_id: expired.cleaner_id,
        })
        .await;

        let rematch = self.match_booking(expired.booking_id).await?;
        Ok((expired, rematch))
    }

    /// Record the cleaner's arrival; the booking moves to IN_PROGRESS and
    /// the punctuality statistic gets a sample.
    pub async fn mark_checked_in(
        &self,
        assignment_id: AssignmentId,
        actor: Actor,
    ) -> EngineResult<Assignment> {
        let assignment = self.store.assignment(assignment_id).await?;
        let now = self.clock.now();
        let (guard, update) = plan_check_in(&assignment, actor, now)?;
        let checked_in = self
            .store
            .transition_assignment(assignment_id, guard, update)
            .await?;

        let booking = self
            .store
            .transition_booking(
                checked_in.booking_id,
                BookingStatus::Assigned,
                BookingStatus::InProgress,
            )
            .await?;
        let on_time = now <= booking.scheduled_start + self.config.no_show_grace();
        self.store
            .record_punctuality(checked_in.cleaner_id, on_time)
            .await?;

        info!(
            assignment_id = %assignment_id,
            booking_id = %checked_in.booking_id,
            on_time,
            "Cleaner checked in"
        );
        Ok(checked_in)
    }

    /// Mark an accepted assignment as a no-show and re-match the booking.
    pub async fn mark_no_show(
        &self,
        assignment_id: AssignmentId,
    ) -> EngineResult<(Assignment, MatchOutcome)> {
        self.mark_no_show_at(assignment_id, self.clock.now()).await
    }

    async fn mark_no_show_at(
        &self,
        assignment_id: AssignmentId,
        now: DateTime<Utc>,
    ) -> EngineResult<(Assignment, MatchOutcome)> {
        let assignment = self.store.assignment(assignment_id).await?;
        let booking = self.store.booking(assignment.booking_id).await?;
        let (guard, update) = plan_no_show(&assignment, &booking, now, self.config.no_show_grace())?;
        let no_show = self
            .store
            .transition_assignment(assignment_id, guard, update)
            .await?;

        self.store
            .record_punctuality(no_show.cleaner_id, false)
            .await?;
        self.store
            .transition_booking(no_show.booking_id, BookingStatus::Assigned, BookingStatus::Open)
            .await?;

        warn!(
            assignment_id = %assignment_id,
            booking_id = %no_show.booking_id,
            cleaner_id = %no_show.cleaner_id,
            "No-show detected, re-matching"
        );
        let rematch = self.match_booking(no_show.booking_id).await?;
        self.notify(NotificationIntent::NoShowDetected {
            assignment_id,
            booking_id: no_show.booking_id,
            cleaner_id: no_show.cleaner_id,
            customer_id: booking.customer_id,
            rematch_started: matches!(rematch, MatchOutcome::Offered(_)),
        })
        .await;

        Ok((no_show, rematch))
    }

    /// Complete a checked-in job; terminal for assignment and booking.
    pub async fn complete(
        &self,
        assignment_id: AssignmentId,
        actor: Actor,
    ) -> EngineResult<Assignment> {
        let assignment = self.store.assignment(assignment_id).await?;
        let (guard, update) = plan_complete(&assignment, actor, self.clock.now())?;
        let completed = self
            .store
            .transition_assignment(assignment_id, guard, update)
            .await?;

        let booking = self
            .store
            .transition_booking(
                completed.booking_id,
                BookingStatus::InProgress,
                BookingStatus::Completed,
            )
            .await?;

        info!(
            assignment_id = %assignment_id,
            booking_id = %completed.booking_id,
            "Job completed"
        );
        self.notify(NotificationIntent::BookingCompleted {
            assignment_id,
            booking_id: completed.booking_id,
            cleaner_id: completed.cleaner_id,
            customer_id: booking.customer_id,
        })
        .await;

        Ok(completed)
    }

    /// Cancel an in-flight assignment together with its booking.
    pub async fn cancel(&self, assignment_id: AssignmentId, actor: Actor) -> EngineResult<Assignment> {
        let assignment = self.store.assignment(assignment_id).await?;
        let booking = self.store.booking(assignment.booking_id).await?;
        let (guard, update) = plan_cancel(&assignment, &booking, actor)?;
        let cancelled = self
            .store
            .transition_assignment(assignment_id, guard, update)
            .await?;

        self.store
            .transition_booking(booking.id, booking.status, BookingStatus::Cancelled)
            .await?;

        info!(
            assignment_id = %assignment_id,
            booking_id = %booking.id,
            actor = %actor,
            "Assignment cancelled"
        );
        self.notify(NotificationIntent::BookingCancelled {
            assignment_id,
            booking_id: booking.id,
            cleaner_id: cancelled.cleaner_id,
            customer_id: booking.customer_id,
        })
        .await;

        Ok(cancelled)
    }

    /// Detect and recover no-shows: every ACCEPTED assignment whose grace
    /// window has elapsed without a check-in is marked NO_SHOW and its
    /// booking re-matched.
    ///
    /// Safe to re-run at any time: assignments a previous sweep (or a
    /// racing check-in) already moved out of ACCEPTED are skipped. One
    /// item's failure never aborts the rest; per-item detail lands in the
    /// returned outcomes.
    pub async fn sweep(&self, now: DateTime<Utc>, token: &str) -> EngineResult<Vec<SweepOutcome>> {
        self.authorize_sweep(token)?;

        let cutoff = now - self.config.no_show_grace();
        let overdue = self.store.accepted_awaiting_checkin_before(cutoff).await?;
        debug!(count = overdue.len(), "Sweeping overdue accepted assignments");

        let mut outcomes = Vec::with_capacity(overdue.len());
        for assignment in overdue {
            let result = match self.mark_no_show_at(assignment.id, now).await {
                Ok((_, rematch)) => SweepResult::NoShowMarked {
                    rematch: (&rematch).into(),
                },
                Err(EngineError::InvalidState { .. }) | Err(EngineError::DeadlineNotReached { .. }) => {
                    SweepResult::Skipped
                }
                Err(e) => {
                    warn!(assignment_id = %assignment.id, error = %e, "Sweep item failed");
                    SweepResult::Failed {
                        detail: e.to_string(),
                    }
                }
            };
            outcomes.push(SweepOutcome {
                assignment_id: assignment.id,
                booking_id: assignment.booking_id,
                previous_cleaner_id: assignment.cleaner_id,
                result,
            });
        }

        Ok(outcomes)
    }

    /// Expire every PENDING offer whose response deadline has passed,
    /// re-matching each affected booking. Same isolation rules as `sweep`.
    pub async fn expire_overdue_offers(&self, now: DateTime<Utc>) -> EngineResult<Vec<SweepOutcome>> {
        let cutoff = now - self.config.offer_timeout();
        let overdue = self.store.pending_offered_before(cutoff).await?;
        debug!(count = overdue.len(), "Expiring overdue pending offers");

        let mut outcomes = Vec::with_capacity(overdue.len());
        for assignment in overdue {
            let result = match self.expire_at(assignment.id, now).await {
                Ok((_, rematch)) => SweepResult::OfferExpired {
                    rematch: (&rematch).into(),
                },
                Err(EngineError::InvalidState { .. }) | Err(EngineError::DeadlineNotReached { .. }) => {
                    SweepResult::Skipped
                }
                Err(e) => {
                    warn!(assignment_id = %assignment.id, error = %e, "Offer expiry failed");
                    SweepResult::Failed {
                        detail: e.to_string(),
                    }
                }
            };
            outcomes.push(SweepOutcome {
                assignment_id: assignment.id,
                booking_id: assignment.booking_id,
                previous_cleaner_id: assignment.cleaner_id,
                result,
            });
        }

        Ok(outcomes)
    }

    /// Retry matching for OPEN bookings with no active assignment, e.g.
    /// ones that previously had no candidates.
    pub async fn rematch_open_bookings(&self) -> EngineResult<Vec<(BookingId, RematchSummary)>> {
        let open = self.store.open_bookings().await?;
        let mut results = Vec::new();

        for booking in open {
            if booking.needs_attention {
                continue;
            }
            match self.match_booking(booking.id).await {
                Ok(outcome) => results.push((booking.id, (&outcome).into())),
                // Another matcher got there first; nothing to record.
                Err(EngineError::BookingAlreadyClaimed { .. }) => {}
                Err(e) => {
                    warn!(booking_id = %booking.id, error = %e, "Re-match failed");
                    results.push((booking.id, RematchSummary::Failed(e.to_string())));
                }
            }
        }

        Ok(results)
    }

    /// One full recovery pass: expire overdue offers, sweep no-shows,
    /// then retry open bookings. This is what the periodic sweeper runs.
    pub async fn recovery_pass(&self, token: &str) -> EngineResult<RecoveryReport> {
        let now = self.clock.now();
        let expired = self.expire_overdue_offers(now).await?;
        let no_shows = self.sweep(now, token).await?;
        let rematched = self.rematch_open_bookings().await?;
        Ok(RecoveryReport {
            expired,
            no_shows,
            rematched,
        })
    }

    fn authorize_sweep(&self, token: &str) -> EngineResult<()> {
        if token != self.config.sweep_token {
            return Err(EngineError::Forbidden {
                actor: Actor::System,
                detail: "sweep token mismatch".to_string(),
            });
        }
        Ok(())
    }

    /// Cleaners already committed to another booking within the conflict
    /// window of this booking's start.
    async fn conflicted_cleaners(
        &self,
        booking: &Booking,
        pool: &[shared::CleanerProfile],
        excluded: &HashSet<CleanerId>,
    ) -> EngineResult<HashSet<CleanerId>> {
        let window = self.config.conflict_window();
        let mut conflicted = HashSet::new();

        for cleaner in pool {
            if excluded.contains(&cleaner.id) || !cleaner.active {
                continue;
            }
            if cleaner.position.distance_km(&booking.location) > cleaner.service_radius_km {
                continue;
            }
            let commitments = self.store.cleaner_commitments(cleaner.id).await?;
            let clash = commitments.iter().any(|b| {
                b.id != booking.id && (b.scheduled_start - booking.scheduled_start).abs() < window
            });
            if clash {
                conflicted.insert(cleaner.id);
            }
        }

        Ok(conflicted)
    }

    /// Best-effort intent emission: a dispatcher outage must not roll back
    /// a committed transition, so failures are logged and dropped.
    async fn notify(&self, intent: NotificationIntent) {
        if let Err(e) = self.notifier.dispatch(intent.clone()).await {
            warn!(
                kind = intent.kind(),
                booking_id = %intent.booking_id(),
                error = %e,
                "Failed to hand intent to dispatcher"
            );
        }
    }
}

fn failed_offer(status: AssignmentStatus) -> bool {
    matches!(
        status,
        AssignmentStatus::Rejected | AssignmentStatus::Expired | AssignmentStatus::NoShow
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockAssignmentStore, MockClock, MockNotifier, MockWeightsSource};
    use chrono::Utc;
    use shared::{CustomerId, GeoPoint, ServiceDetails};

    fn test_engine(
        store: MockAssignmentStore,
        clock: MockClock,
        notifier: MockNotifier,
        weights: MockWeightsSource,
    ) -> Engine<MockAssignmentStore, MockClock, MockNotifier, MockWeightsSource> {
        Engine::new(store, clock, notifier, weights, EngineConfig::default())
    }

    fn open_booking() -> Booking {
        Booking::new(
            CustomerId::new(),
            Utc::now(),
            GeoPoint::new(40.7128, -74.0060),
            ServiceDetails::default(),
            Utc::now(),
        )
    }

    fn failed_assignment(booking_id: BookingId, status: AssignmentStatus) -> Assignment {
        let mut a = Assignment::new_offer(booking_id, CleanerId::new(), Utc::now());
        a.status = status;
        a
    }

    #[tokio::test]
    async fn accept_by_wrong_cleaner_is_forbidden_without_any_write() {
        let assignment = Assignment::new_offer(BookingId::new(), CleanerId::new(), Utc::now());
        let assignment_id = assignment.id;

        let mut store = MockAssignmentStore::new();
        store
            .expect_assignment()
            .returning(move |_| Ok(assignment.clone()));
        store.expect_transition_assignment().times(0);
        store.expect_record_offer_response().times(0);

        let mut clock = MockClock::new();
        clock.expect_now().returning(Utc::now);

        let engine = test_engine(store, clock, MockNotifier::new(), MockWeightsSource::new());
        let err = engine
            .accept(assignment_id, Actor::Cleaner(CleanerId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn match_flags_booking_after_offer_budget_exhausted() {
        let booking = open_booking();
        let booking_id = booking.id;
        let history: Vec<Assignment> = (0..5)
            .map(|i| {
                let status = if i % 2 == 0 {
                    AssignmentStatus::Rejected
                } else {
                    AssignmentStatus::Expired
                };
                failed_assignment(booking_id, status)
            })
            .collect();

        let mut store = MockAssignmentStore::new();
        let booking_clone = booking.clone();
        store
            .expect_booking()
            .returning(move |_| Ok(booking_clone.clone()));
        store
            .expect_assignments_for_booking()
            .returning(move |_| Ok(history.clone()));
        let flagged = {
            let mut b = booking.clone();
            b.needs_attention = true;
            b
        };
        store
            .expect_flag_booking_attention()
            .times(1)
            .returning(move |_| Ok(flagged.clone()));
        store.expect_offer_assignment().times(0);

        let mut notifier = MockNotifier::new();
        notifier
            .expect_dispatch()
            .withf(|intent| matches!(intent, NotificationIntent::ManualInterventionRequired { .. }))
            .times(1)
            .returning(|_| Ok(()));

        let engine = test_engine(store, MockClock::new(), notifier, MockWeightsSource::new());
        let outcome = engine.match_booking(booking_id).await.unwrap();
        assert!(matches!(
            outcome,
            MatchOutcome::AttentionFlagged { failed_offers: 5 }
        ));
    }

    #[tokio::test]
    async fn already_flagged_booking_is_not_reflagged() {
        let mut booking = open_booking();
        booking.needs_attention = true;
        let booking_id = booking.id;

        let mut store = MockAssignmentStore::new();
        store
            .expect_booking()
            .returning(move |_| Ok(booking.clone()));
        store
            .expect_assignments_for_booking()
            .returning(|_| Ok(Vec::new()));
        store.expect_flag_booking_attention().times(0);

        let mut notifier = MockNotifier::new();
        notifier.expect_dispatch().times(0);

        let engine = test_engine(store, MockClock::new(), notifier, MockWeightsSource::new());
        let outcome = engine.match_booking(booking_id).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::AttentionFlagged { .. }));
    }

    #[tokio::test]
    async fn match_with_empty_pool_reports_no_candidates() {
        let booking = open_booking();
        let booking_id = booking.id;

        let mut store = MockAssignmentStore::new();
        store
            .expect_booking()
            .returning(move |_| Ok(booking.clone()));
        store
            .expect_assignments_for_booking()
            .returning(|_| Ok(Vec::new()));
        store.expect_eligible_cleaners().returning(|| Ok(Vec::new()));
        store.expect_offer_assignment().times(0);

        let mut weights = MockWeightsSource::new();
        weights
            .expect_snapshot()
            .returning(AlgorithmWeights::default);

        let engine = test_engine(store, MockClock::new(), MockNotifier::new(), weights);
        let outcome = engine.match_booking(booking_id).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::NoCandidates));
    }

    #[tokio::test]
    async fn sweep_rejects_wrong_token() {
        let mut store = MockAssignmentStore::new();
        store.expect_accepted_awaiting_checkin_before().times(0);

        let engine = test_engine(
            store,
            MockClock::new(),
            MockNotifier::new(),
            MockWeightsSource::new(),
        );
        let err = engine.sweep(Utc::now(), "not-the-token").await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn match_on_claimed_booking_loses_the_race() {
        let booking = open_booking();
        let booking_id = booking.id;
        let active = Assignment::new_offer(booking_id, CleanerId::new(), Utc::now());

        let mut store = MockAssignmentStore::new();
        store
            .expect_booking()
            .returning(move |_| Ok(booking.clone()));
        store
            .expect_assignments_for_booking()
            .returning(move |_| Ok(vec![active.clone()]));
        store.expect_offer_assignment().times(0);

        let engine = test_engine(
            store,
            MockClock::new(),
            MockNotifier::new(),
            MockWeightsSource::new(),
        );
        let err = engine.match_booking(booking_id).await.unwrap_err();
        assert!(matches!(err, EngineError::BookingAlreadyClaimed { .. }));
    }
}
