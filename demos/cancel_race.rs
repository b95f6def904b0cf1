//! # Example: cancel_race
//!
//! Races `cancel()` against many short tasks that ignore cancellation and always fail,
//! then checks that every result reached exactly one consumer:
//!
//! - completion won → `on_error` ran once
//! - cancel won     → the fallback sink ran once (or zero times if the work never started)
//!
//! ## Run
//! ```bash
//! cargo run --example cancel_race
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tasklatch::{
    FallbackSink, OrphanedError, Runner, RunnerConfig, TaskError, TaskFn, TaskRef, TaskState,
};
use tokio_util::sync::CancellationToken;

const TASKS: u64 = 200;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    println!("=== cancel_race example ===\n");

    let orphans = Arc::new(AtomicUsize::new(0));
    let fallback = Arc::new(FallbackSink::new());
    let seen = Arc::clone(&orphans);
    fallback.set(move |_err: OrphanedError| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let runner = Runner::builder(RunnerConfig {
        max_concurrent: 32,
        ..RunnerConfig::default()
    })
    .with_fallback(fallback)
    .build();

    let started = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(TASKS as usize);

    for i in 0..TASKS {
        let started = Arc::clone(&started);
        let task: TaskRef = TaskFn::arc(format!("racer-{i}"), move |_ctx: CancellationToken| {
            let started = Arc::clone(&started);
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(i % 5)).await;
                Err(TaskError::fail(format!("racer-{i} failed")))
            }
        });

        let handle = runner.submit(task);
        let errs = Arc::clone(&errors);
        handle.subscribe(
            || {},
            move |_e| {
                errs.fetch_add(1, Ordering::SeqCst);
            },
        )?;

        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis((i * 3) % 5)).await;
            canceller.cancel();
        });
        handles.push(handle);
    }

    let mut cancelled = 0usize;
    for h in &handles {
        h.settled().await;
        if h.state() == TaskState::Cancelled {
            cancelled += 1;
        }
    }
    runner.shutdown().await?;

    let started = started.load(Ordering::SeqCst);
    let errors = errors.load(Ordering::SeqCst);
    let orphans = orphans.load(Ordering::SeqCst);

    println!("tasks     : {TASKS}");
    println!("started   : {started}");
    println!("cancelled : {cancelled}");
    println!("on_error  : {errors}");
    println!("fallback  : {orphans}");

    anyhow::ensure!(
        errors + orphans == started,
        "every started task must deliver exactly once"
    );
    println!("\nok: {started} results, {started} deliveries");
    Ok(())
}
