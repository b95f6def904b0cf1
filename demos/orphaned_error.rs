//! # Example: orphaned_error
//!
//! A task sleeps for 200ms and is cancelled after 100ms. The interrupted sleep fails
//! *after* cancellation already disposed the task's subscriber, so the error is orphaned.
//!
//! Runs the scenario twice:
//! - without a fallback sink: the error is dropped (reported as `OrphanDropped`), nothing crashes
//! - with a fallback sink: the error reaches the sink exactly once
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► runner.submit(sleeper)          (200ms interruptible sleep)
//!   ├─► handle.subscribe(..)            (never invoked)
//!   ├─► sleep 100ms
//!   ├─► handle.cancel()                 (latch: Pending → Cancelled, token fired)
//!   │     └─► sleep fails: Interrupted
//!   │           └─► FallbackSink (or dropped when unset)
//!   └─► runner.shutdown()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example orphaned_error
//! cargo run --example orphaned_error --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tasklatch::{
    FallbackSink, OrphanedError, Runner, RunnerConfig, Subscribe, TaskFn, TaskHandle, TaskRef,
};
use tokio_util::sync::CancellationToken;

// Optional event printer (requires the "logging" feature).
#[cfg(feature = "logging")]
fn subscribers() -> Vec<Arc<dyn Subscribe>> {
    vec![Arc::new(tasklatch::LogWriter::new())]
}

#[cfg(not(feature = "logging"))]
fn subscribers() -> Vec<Arc<dyn Subscribe>> {
    Vec::new()
}

fn sleeper() -> TaskRef {
    TaskFn::arc("sleeper", |ctx: CancellationToken| async move {
        println!("[sleeper] sleeping 200ms");
        tasklatch::sleep(&ctx, Duration::from_millis(200)).await
    })
}

async fn cancel_midway(runner: &Runner) -> anyhow::Result<TaskHandle> {
    let handle = runner.submit(sleeper());
    handle.subscribe(
        || println!("[sleeper] on_success (unexpected)"),
        |e| println!("[sleeper] on_error (unexpected): {e}"),
    )?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("[main] cancel -> {}", handle.cancel());
    handle.settled().await;
    Ok(handle)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== orphaned_error example ===\n");

    println!("--- 1. no fallback sink ---");
    let runner = Runner::builder(RunnerConfig::default())
        .with_subscribers(subscribers())
        .build();
    let handle = cancel_midway(&runner).await?;
    println!("[main] state = {}", handle.state().as_label());
    runner.shutdown().await?;

    println!("\n--- 2. with fallback sink ---");
    let orphans = Arc::new(AtomicUsize::new(0));
    let fallback = Arc::new(FallbackSink::new());
    let seen = Arc::clone(&orphans);
    fallback.set(move |err: OrphanedError| {
        seen.fetch_add(1, Ordering::SeqCst);
        println!("[fallback] task={} id={} err={}", err.task, err.task_id, err.error);
    });

    let runner = Runner::builder(RunnerConfig::default())
        .with_subscribers(subscribers())
        .with_fallback(fallback)
        .build();
    let handle = cancel_midway(&runner).await?;
    println!("[main] state = {}", handle.state().as_label());
    runner.shutdown().await?;

    let delivered = orphans.load(Ordering::SeqCst);
    println!("\n[main] orphaned errors delivered to fallback: {delivered}");
    anyhow::ensure!(delivered == 1, "expected exactly one orphaned error");
    Ok(())
}
