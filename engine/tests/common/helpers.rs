//! Harness construction helpers for integration tests

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedReceiver;

use engine::services::{ChannelNotifier, FixedClock, InMemoryStore, SharedWeights};
use engine::{Engine, EngineConfig};
use shared::{AlgorithmWeights, NotificationIntent};

pub type TestEngine = Engine<InMemoryStore, FixedClock, ChannelNotifier, SharedWeights>;

/// A fully wired engine with handles to its collaborators
pub struct TestHarness {
    pub engine: Arc<TestEngine>,
    pub store: InMemoryStore,
    pub clock: FixedClock,
    pub intents: UnboundedReceiver<NotificationIntent>,
}

impl TestHarness {
    /// Engine with default configuration, pinned to `t0`.
    pub fn at(t0: DateTime<Utc>) -> Self {
        Self::build(t0, EngineConfig::default(), AlgorithmWeights::default())
    }

    /// Engine whose scoring uses the given weights.
    pub fn with_weights(t0: DateTime<Utc>, weights: AlgorithmWeights) -> Self {
        Self::build(t0, EngineConfig::default(), weights)
    }

    pub fn build(t0: DateTime<Utc>, config: EngineConfig, weights: AlgorithmWeights) -> Self {
        let store = InMemoryStore::new();
        let clock = FixedClock::at(t0);
        let (notifier, intents) = ChannelNotifier::new();
        let engine = Arc::new(Engine::new(
            store.clone(),
            clock.clone(),
            notifier,
            SharedWeights::new(weights).expect("test weights must be valid"),
            config,
        ));
        Self {
            engine,
            store,
            clock,
            intents,
        }
    }

    /// The sweep token the harness engine accepts.
    pub fn sweep_token(&self) -> String {
        self.engine.config().sweep_token.clone()
    }

    /// Drain every intent emitted so far.
    pub fn drain_intents(&mut self) -> Vec<NotificationIntent> {
        let mut intents = Vec::new();
        while let Ok(intent) = self.intents.try_recv() {
            intents.push(intent);
        }
        intents
    }
}
