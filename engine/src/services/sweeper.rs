//! Periodic recovery sweeper
//!
//! Timer-driven wrapper around `Engine::recovery_pass`: wakes on a fixed
//! period, expires overdue offers, marks no-shows and retries open
//! bookings. An external job runner can invoke `Engine::sweep` directly
//! instead; both go through the same transition core.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::engine::Engine;
use crate::traits::{AssignmentStore, Clock, Notifier, WeightsSource};

pub struct Sweeper<S, C, N, W>
where
    S: AssignmentStore + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    W: WeightsSource + Send + Sync + 'static,
{
    engine: Arc<Engine<S, C, N, W>>,
    token: String,
}

impl<S, C, N, W> Sweeper<S, C, N, W>
where
    S: AssignmentStore + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    W: WeightsSource + Send + Sync + 'static,
{
    pub fn new(engine: Arc<Engine<S, C, N, W>>, token: String) -> Self {
        Self { engine, token }
    }

    /// Run until a shutdown signal arrives. Each tick performs one full
    /// recovery pass; a failing pass is logged and the next tick runs
    /// normally.
    pub async fn run(self, mut shutdown: mpsc::Receiver<()>) {
        let period = self.engine.config().sweep_interval();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "Recovery sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.engine.recovery_pass(&self.token).await {
                        Ok(report) => {
                            if !report.is_quiet() {
                                info!(
                                    expired = report.expired.len(),
                                    no_shows = report.no_shows.len(),
                                    rematched = report.rematched.len(),
                                    "Recovery pass finished"
                                );
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "Recovery pass failed");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Recovery sweeper shutting down");
                    break;
                }
            }
        }
    }
}
