use std::sync::Arc;

use crate::{
    config::RunnerConfig,
    events::Bus,
    fallback::FallbackSink,
    subscribers::{Subscribe, SubscriberSet},
};
use super::runner::Runner;

/// Builder for constructing a [`Runner`] with optional subscribers and a shared fallback sink.
pub struct RunnerBuilder {
    cfg: RunnerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    fallback: Option<Arc<FallbackSink>>,
}

impl RunnerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RunnerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            fallback: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (task lifecycle, orphaned errors, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Routes orphaned errors to `fallback`.
    ///
    /// Share the same `Arc` with the code that configures the process-wide sink;
    /// without this call the runner gets a private, unset fallback.
    pub fn with_fallback(mut self, fallback: Arc<FallbackSink>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Builds the runner.
    ///
    /// Must be called inside a tokio runtime: this spawns the event listener and
    /// one worker per subscriber.
    pub fn build(self) -> Runner {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let fallback = self.fallback.unwrap_or_default();

        Runner::new_internal(self.cfg, bus, subs, fallback)
    }
}
