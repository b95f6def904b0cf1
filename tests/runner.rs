use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tasklatch::{
    Event, EventKind, FallbackSink, OrphanedError, Runner, RunnerConfig, RuntimeError, Subscribe,
    TaskError, TaskFn, TaskRef, TaskState,
};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    fn first(&self, kind: EventKind) -> Option<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.kind == kind)
            .cloned()
    }

    /// `seq` of every event per task, keyed by task id then kind.
    fn seqs_by_task(&self) -> HashMap<u64, HashMap<EventKind, u64>> {
        let mut out: HashMap<u64, HashMap<EventKind, u64>> = HashMap::new();
        for ev in self.events.lock().unwrap().iter() {
            if let Some(id) = ev.task_id {
                out.entry(id).or_default().insert(ev.kind, ev.seq);
            }
        }
        out
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }

    fn queue_capacity(&self) -> usize {
        1 << 16
    }
}

fn observed(cfg: RunnerConfig) -> (Runner, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let runner = Runner::builder(cfg)
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build();
    (runner, recorder)
}

fn sleeper(name: &'static str, dur: Duration) -> TaskRef {
    TaskFn::arc(name, move |ctx: CancellationToken| async move {
        tasklatch::sleep(&ctx, dur).await
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn orphan_without_sink_is_reported_and_dropped() {
    let (runner, recorder) = observed(RunnerConfig::default());
    assert!(!runner.fallback().is_set());

    let handle = runner.submit(sleeper("sleeper", Duration::from_millis(200)));
    handle
        .subscribe(|| panic!("no success expected"), |_e| panic!("no error expected"))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.cancel());
    handle.settled().await;
    runner.shutdown().await.unwrap();

    assert_eq!(recorder.count(EventKind::OrphanDropped), 1);
    assert_eq!(recorder.count(EventKind::CallbackPanicked), 0);
    let dropped = recorder.first(EventKind::OrphanDropped).unwrap();
    assert_eq!(dropped.task_id, Some(handle.id()));
    assert_eq!(dropped.task.as_deref(), Some("sleeper"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn event_stream_follows_task_lifecycle() {
    let (runner, recorder) = observed(RunnerConfig::default());

    let handle = runner.submit(TaskFn::arc("ok", |_ctx: CancellationToken| async { Ok(()) }));
    handle.settled().await;
    runner.shutdown().await.unwrap();

    let kinds = recorder.kinds();
    assert_eq!(
        kinds,
        vec![
            EventKind::TaskSubmitted,
            EventKind::TaskStarting,
            EventKind::TaskSucceeded,
            EventKind::ShutdownRequested,
            EventKind::AllStoppedWithin,
        ]
    );

    let seqs: Vec<u64> = recorder.events.lock().unwrap().iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timeout_cancels_and_orphans_the_interruption() {
    let orphans = Arc::new(Mutex::new(Vec::<OrphanedError>::new()));
    let fallback = Arc::new(FallbackSink::new());
    let seen = Arc::clone(&orphans);
    fallback.set(move |e: OrphanedError| seen.lock().unwrap().push(e));

    let recorder = Arc::new(Recorder::default());
    let runner = Runner::builder(RunnerConfig::default())
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .with_fallback(fallback)
        .build();

    let handle = runner.submit_with_timeout(
        sleeper("slow", Duration::from_secs(5)),
        Duration::from_millis(50),
    );
    assert_eq!(handle.wait().await, TaskState::Cancelled);
    handle.settled().await;
    runner.shutdown().await.unwrap();

    let orphans = orphans.lock().unwrap();
    assert_eq!(orphans.len(), 1);
    assert!(orphans[0].error.is_interruption());

    let hit = recorder.first(EventKind::TimeoutHit).unwrap();
    assert_eq!(hit.timeout_ms, Some(50));
    assert_eq!(recorder.count(EventKind::OrphanDelivered), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn default_timeout_applies_to_plain_submit() {
    let runner = Runner::new(RunnerConfig {
        timeout: Duration::from_millis(30),
        ..RunnerConfig::default()
    });

    let handle = runner.submit(sleeper("slow", Duration::from_secs(5)));
    assert_eq!(handle.wait().await, TaskState::Cancelled);

    let quick = runner.submit(sleeper("quick", Duration::from_millis(1)));
    assert_eq!(quick.wait().await, TaskState::Succeeded);
    runner.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_all_counts_only_winning_cancellations() {
    let runner = Runner::new(RunnerConfig::default());

    let done = runner.submit(TaskFn::arc("done", |_ctx: CancellationToken| async { Ok(()) }));
    done.settled().await;

    let handles: Vec<_> = (0..3)
        .map(|_| runner.submit(sleeper("long", Duration::from_secs(30))))
        .collect();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(runner.in_flight(), 3);

    assert_eq!(runner.cancel_all(), 3);
    assert_eq!(runner.cancel_all(), 0);

    for h in &handles {
        h.settled().await;
        assert_eq!(h.state(), TaskState::Cancelled);
    }
    assert_eq!(runner.in_flight(), 0);
    assert_eq!(done.state(), TaskState::Succeeded);
    runner.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_interrupts_cooperative_tasks_within_grace() {
    let orphans = Arc::new(Mutex::new(0usize));
    let fallback = Arc::new(FallbackSink::new());
    let seen = Arc::clone(&orphans);
    fallback.set(move |_e: OrphanedError| *seen.lock().unwrap() += 1);

    let runner = Runner::builder(RunnerConfig {
        grace: Duration::from_secs(2),
        ..RunnerConfig::default()
    })
    .with_fallback(fallback)
    .build();

    let a = runner.submit(sleeper("a", Duration::from_secs(30)));
    let b = runner.submit(sleeper("b", Duration::from_secs(30)));
    tokio::time::sleep(Duration::from_millis(20)).await;

    runner.shutdown().await.unwrap();
    assert!(a.is_settled() && b.is_settled());
    assert_eq!(*orphans.lock().unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_aborts_tasks_that_ignore_cancellation() {
    let (runner, recorder) = observed(RunnerConfig {
        grace: Duration::from_millis(50),
        ..RunnerConfig::default()
    });

    let stubborn: TaskRef = TaskFn::arc("stubborn", |_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    });
    let handle = runner.submit(stubborn);
    let polite = runner.submit(sleeper("polite", Duration::from_secs(30)));
    tokio::time::sleep(Duration::from_millis(20)).await;

    match runner.shutdown().await {
        Err(RuntimeError::GraceExceeded { grace, stuck }) => {
            assert_eq!(grace, Duration::from_millis(50));
            assert_eq!(stuck, vec!["stubborn".to_string()]);
        }
        other => panic!("expected GraceExceeded, got {other:?}"),
    }

    handle.settled().await;
    assert!(polite.is_settled());
    assert_eq!(runner.in_flight(), 0);
    assert_eq!(handle.state(), TaskState::Cancelled);
    assert_eq!(recorder.count(EventKind::GraceExceeded), 1);
    assert_eq!(recorder.count(EventKind::AllStoppedWithin), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_callback_is_contained() {
    let (runner, recorder) = observed(RunnerConfig::default());

    let task: TaskRef = TaskFn::arc("fails", |_ctx: CancellationToken| async {
        Err(TaskError::fail("nope"))
    });
    let handle = runner.submit(task);
    handle
        .subscribe(|| {}, |_e| panic!("callback boom"))
        .unwrap();
    handle.settled().await;

    // The runner keeps working after a callback panic.
    let next = runner.submit(TaskFn::arc("next", |_ctx: CancellationToken| async { Ok(()) }));
    assert_eq!(next.wait().await, TaskState::Succeeded);
    next.settled().await;
    runner.shutdown().await.unwrap();

    let ev = recorder.first(EventKind::CallbackPanicked).unwrap();
    assert_eq!(ev.reason.as_deref(), Some("callback boom"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fallback_replacement_takes_effect_for_later_orphans() {
    let first = Arc::new(Mutex::new(0usize));
    let second = Arc::new(Mutex::new(0usize));
    let runner = Runner::new(RunnerConfig::default());

    let f = Arc::clone(&first);
    runner
        .fallback()
        .set(move |_e: OrphanedError| *f.lock().unwrap() += 1);
    let h = runner.submit(sleeper("one", Duration::from_secs(30)));
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.cancel();
    h.settled().await;

    let s = Arc::clone(&second);
    runner
        .fallback()
        .set(move |_e: OrphanedError| *s.lock().unwrap() += 1);
    let h = runner.submit(sleeper("two", Duration::from_secs(30)));
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.cancel();
    h.settled().await;

    assert_eq!(*first.lock().unwrap(), 1);
    assert_eq!(*second.lock().unwrap(), 1);
    runner.shutdown().await.unwrap();
}

fn roomy() -> RunnerConfig {
    RunnerConfig {
        bus_capacity: 1 << 16,
        ..RunnerConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_is_ordered_before_the_orphan_it_causes() {
    const TASKS: usize = 1000;
    let (runner, recorder) = observed(roomy());

    let handles: Vec<_> = (0..TASKS)
        .map(|_| runner.submit(sleeper("sleeper", Duration::from_secs(10))))
        .collect();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let cancelling = handles.clone();
    std::thread::spawn(move || {
        for h in &cancelling {
            h.cancel();
        }
    })
    .join()
    .unwrap();

    for h in &handles {
        h.settled().await;
    }
    runner.shutdown().await.unwrap();

    let seqs = recorder.seqs_by_task();
    for h in &handles {
        let events = &seqs[&h.id()];
        let cancelled = events[&EventKind::TaskCancelled];
        match events.get(&EventKind::OrphanDropped) {
            Some(&orphan) => assert!(
                cancelled < orphan,
                "task {}: TaskCancelled seq {cancelled} after OrphanDropped seq {orphan}",
                h.id()
            ),
            None => assert!(events.contains_key(&EventKind::TaskSkipped)),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_observed_before_start_always_skips_the_work() {
    const TASKS: usize = 500;
    let (runner, recorder) = observed(roomy());

    let mut handles = Vec::with_capacity(TASKS);
    let mut started = Vec::with_capacity(TASKS);
    for _ in 0..TASKS {
        let flag = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&flag);
        let task: TaskRef = TaskFn::arc("racer", move |_ctx: CancellationToken| {
            let seen = Arc::clone(&seen);
            async move {
                seen.store(true, Ordering::SeqCst);
                Ok(())
            }
        });
        handles.push(runner.submit(task));
        started.push(flag);
    }

    let cancelling = handles.clone();
    let canceller = std::thread::spawn(move || {
        for h in &cancelling {
            h.cancel();
        }
    });
    canceller.join().unwrap();

    for h in &handles {
        h.settled().await;
    }
    runner.shutdown().await.unwrap();

    let seqs = recorder.seqs_by_task();
    for (h, flag) in handles.iter().zip(&started) {
        let events = &seqs[&h.id()];
        let ran = flag.load(Ordering::SeqCst);
        let skipped = events.contains_key(&EventKind::TaskSkipped);
        assert_ne!(ran, skipped, "task {}: ran={ran} skipped={skipped}", h.id());

        if let (Some(cancelled), Some(starting)) = (
            events.get(&EventKind::TaskCancelled),
            events.get(&EventKind::TaskStarting),
        ) {
            if cancelled < starting {
                assert!(!ran, "task {} ran after TaskCancelled preceded TaskStarting", h.id());
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zero_timeout_arms_nothing() {
    let (runner, recorder) = observed(RunnerConfig::default());

    let handle = runner.submit_with_timeout(
        sleeper("patient", Duration::from_millis(20)),
        Duration::ZERO,
    );
    assert_eq!(handle.wait().await, TaskState::Succeeded);
    handle.settled().await;
    runner.shutdown().await.unwrap();

    let submitted = recorder.first(EventKind::TaskSubmitted).unwrap();
    assert_eq!(submitted.timeout_ms, None);
    assert_eq!(recorder.count(EventKind::TimeoutHit), 0);
}
