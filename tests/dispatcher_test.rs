//! Dispatcher concurrency and graceful shutdown
//!
//! Run with: cargo test --test dispatcher_test

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{press, RecordingSink};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use workouts_bot::core::Metrics;
use workouts_bot::telegram::action::Domain;
use workouts_bot::telegram::event::InboundEvent;
use workouts_bot::telegram::flows::FlowError;
use workouts_bot::telegram::registry::{Handler, Registries};
use workouts_bot::telegram::reply::{Reply, ReplySink};
use workouts_bot::telegram::{Dispatcher, ShutdownOutcome};

/// Sleeps, then counts itself as finished.
struct SlowHandler {
    delay: Duration,
    finished: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler for SlowHandler {
    async fn handle(&self, _event: &InboundEvent) -> Result<Reply, FlowError> {
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::text("done"))
    }
}

fn dispatcher(delay: Duration, finished: Arc<AtomicUsize>) -> (Dispatcher, Arc<RecordingSink>) {
    let mut registries = Registries::default();
    registries
        .callbacks
        .register(Domain::Set, Arc::new(SlowHandler { delay, finished }))
        .unwrap();
    let sink = Arc::new(RecordingSink::default());
    let sink_dyn: Arc<dyn ReplySink> = sink.clone();
    let dispatcher = Dispatcher::new(Arc::new(registries), sink_dyn, Arc::new(Metrics::new().unwrap()));
    (dispatcher, sink)
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_handlers() {
    let finished = Arc::new(AtomicUsize::new(0));
    let (dispatcher, sink) = dispatcher(Duration::from_millis(200), Arc::clone(&finished));
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    tx.send(press(1, "set:complete:1:1")).await.unwrap();
    tx.send(press(2, "set:complete:2:1")).await.unwrap();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let outcome = dispatcher.run(rx, cancel, Duration::from_secs(5)).await;

    assert_eq!(outcome, ShutdownOutcome::Completed);
    assert_eq!(finished.load(Ordering::SeqCst), 2);
    assert_eq!(sink.bodies(), vec!["done".to_string(), "done".to_string()]);
}

#[tokio::test]
async fn test_shutdown_times_out_on_slow_handler() {
    let finished = Arc::new(AtomicUsize::new(0));
    let (dispatcher, _sink) = dispatcher(Duration::from_secs(30), Arc::clone(&finished));
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    tx.send(press(1, "set:complete:1:1")).await.unwrap();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let outcome = dispatcher.run(rx, cancel, Duration::from_millis(100)).await;

    assert_eq!(outcome, ShutdownOutcome::TimedOut);
    assert_eq!(finished.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_events_are_handled_concurrently() {
    let finished = Arc::new(AtomicUsize::new(0));
    let (dispatcher, _sink) = dispatcher(Duration::from_millis(300), Arc::clone(&finished));
    let (tx, rx) = mpsc::channel(16);

    for user in 0..5 {
        tx.send(press(user, "set:complete:1:1")).await.unwrap();
    }
    drop(tx);

    // Five 300ms handlers in well under 5 x 300ms means they overlapped.
    let started = tokio::time::Instant::now();
    let outcome = dispatcher.run(rx, CancellationToken::new(), Duration::from_secs(5)).await;

    assert_eq!(outcome, ShutdownOutcome::Completed);
    assert_eq!(finished.load(Ordering::SeqCst), 5);
    assert!(started.elapsed() < Duration::from_millis(1200));
}
