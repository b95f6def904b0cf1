//! # Runner: submits tasks, fans out events, and tears everything down.
//!
//! The [`Runner`] owns the event bus, the listener that feeds the [`SubscriberSet`],
//! the in-flight [`Registry`] and a shared [`FallbackSink`].
//!
//! ## High-level architecture
//! ```text
//! submit(task) ──► TaskSlot (latch + delivery cell) ──► Registry.insert
//!                       │
//!                       └──► tokio::spawn(Worker::run) ──► task.spawn(token)
//!                                   │
//!                                   ├─ completion wins ──► on_success / on_error
//!                                   └─ cancel wins     ──► FallbackSink (errors)
//!
//! Event flow:
//!   TaskSlot / Worker / Runner ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!
//! Shutdown path:
//!   shutdown()
//!     └─► Bus.publish(ShutdownRequested)
//!     └─► cancel_all()            (orphaned errors still reach the sink)
//!     └─► wait settled up to cfg.grace:
//!            ├─ Ok       → Bus.publish(AllStoppedWithin)
//!            └─ Timeout  → abort stuck workers, Bus.publish(GraceExceeded)
//!     └─► stop listener (drains bus, then subscriber queues)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tasklatch::{FallbackSink, OrphanedError, Runner, RunnerConfig, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fallback = Arc::new(FallbackSink::new());
//!     fallback.set(|err: OrphanedError| eprintln!("global error: {}", err.error));
//!
//!     let runner = Runner::builder(RunnerConfig::default())
//!         .with_fallback(Arc::clone(&fallback))
//!         .build();
//!
//!     let sleeper: TaskRef = TaskFn::arc("sleeper", |ctx: CancellationToken| async move {
//!         tasklatch::sleep(&ctx, Duration::from_millis(200)).await
//!     });
//!
//!     let handle = runner.submit(sleeper);
//!     handle.subscribe(|| println!("done"), |e| println!("error: {e}"))?;
//!
//!     tokio::time::sleep(Duration::from_millis(20)).await;
//!     handle.cancel();
//!     handle.settled().await;
//!
//!     runner.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::RunnerConfig;
use crate::core::builder::RunnerBuilder;
use crate::core::handle::TaskHandle;
use crate::core::registry::Registry;
use crate::core::slot::{TaskId, TaskSlot};
use crate::core::worker::Worker;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::fallback::FallbackSink;
use crate::subscribers::SubscriberSet;
use crate::tasks::TaskRef;

/// Cancellable task runner.
///
/// Must be created inside a tokio runtime: construction spawns the event listener, and
/// every submission spawns a worker.
///
/// Dropping a runner without calling [`shutdown`](Self::shutdown) stops event fan-out but
/// leaves in-flight tasks running detached; their results are still routed.
pub struct Runner {
    cfg: RunnerConfig,
    bus: Bus,
    fallback: Arc<FallbackSink>,
    registry: Arc<Registry>,
    semaphore: Option<Arc<Semaphore>>,
    next_id: AtomicU64,
    stop: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Runner {
    /// Creates a runner with no subscribers and a private, unset fallback sink.
    pub fn new(cfg: RunnerConfig) -> Self {
        RunnerBuilder::new(cfg).build()
    }

    /// Returns a builder for a runner with subscribers and/or a shared fallback sink.
    pub fn builder(cfg: RunnerConfig) -> RunnerBuilder {
        RunnerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: RunnerConfig,
        bus: Bus,
        subs: SubscriberSet,
        fallback: Arc<FallbackSink>,
    ) -> Self {
        let stop = CancellationToken::new();
        let listener = spawn_listener(bus.subscribe(), subs, stop.clone());
        let semaphore = cfg.concurrency_limit().map(Semaphore::new).map(Arc::new);

        Self {
            cfg,
            bus,
            fallback,
            registry: Arc::new(Registry::new()),
            semaphore,
            next_id: AtomicU64::new(1),
            stop,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Schedules `task` and returns its handle.
    ///
    /// Uses the configured default timeout (`RunnerConfig::timeout`, `0s` = none).
    pub fn submit(&self, task: TaskRef) -> TaskHandle {
        self.spawn(task, self.cfg.default_timeout())
    }

    /// Schedules `task` with its own timeout: once `timeout` has elapsed since the
    /// work started, the task is cancelled as if by [`TaskHandle::cancel`].
    ///
    /// `Duration::ZERO` means no timeout.
    pub fn submit_with_timeout(&self, task: TaskRef, timeout: Duration) -> TaskHandle {
        self.spawn(task, Some(timeout))
    }

    /// Cancels every in-flight task.
    ///
    /// Returns how many tasks this call actually cancelled (tasks whose result was
    /// already captured are unaffected).
    pub fn cancel_all(&self) -> usize {
        self.registry
            .snapshot()
            .iter()
            .filter(|slot| slot.cancel())
            .count()
    }

    /// Number of tasks whose worker has not exited yet.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    /// Fallback sink this runner routes orphaned errors to.
    pub fn fallback(&self) -> &Arc<FallbackSink> {
        &self.fallback
    }

    /// Runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }

    /// Cancels all tasks and waits for them to settle within `cfg.grace`.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout, aborts the stuck workers and returns
    /// [`RuntimeError::GraceExceeded`] with their names. In both cases the event
    /// listener is drained and stopped before returning.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.cancel_all();

        let res = self.wait_all_with_grace().await;
        self.stop_listener().await;
        res
    }

    async fn wait_all_with_grace(&self) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let pending = self.registry.snapshot();
        let done = async {
            for slot in &pending {
                slot.wait_exited().await;
            }
        };

        match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.registry.abort_all();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    async fn stop_listener(&self) {
        self.stop.cancel();
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn spawn(&self, task: TaskRef, timeout: Option<Duration>) -> TaskHandle {
        let timeout = timeout.filter(|d| *d > Duration::ZERO);
        let id: TaskId = self.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(TaskSlot::new(id, Arc::from(task.name()), self.bus.clone()));

        let mut submitted = slot.event(EventKind::TaskSubmitted);
        if let Some(dur) = timeout {
            submitted = submitted.with_timeout(dur);
        }
        self.bus.publish(submitted);

        self.registry.insert(Arc::clone(&slot));
        let worker = Worker {
            slot: Arc::clone(&slot),
            task,
            timeout,
            semaphore: self.semaphore.clone(),
            fallback: Arc::clone(&self.fallback),
            registry: Arc::clone(&self.registry),
        };
        let join = tokio::spawn(worker.run());
        self.registry.attach(id, join.abort_handle());

        TaskHandle::new(slot)
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Forwards bus events to the subscriber set until stopped, then drains and closes it.
fn spawn_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => set.emit(&ev),
                            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    })
}
