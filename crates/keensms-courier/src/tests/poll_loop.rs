//! Interval driver and shutdown.

use super::harness::{engine, unread, Failure, MockAction, MockRouter};
use crate::engine::DEFAULT_OUTAGE_LIMIT;
use crate::error::CourierError;
use crate::poll_loop::PollLoop;
use keensms_config::ReconcilePolicy;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

const INTERVAL: Duration = Duration::from_millis(10);

#[tokio::test]
async fn repeats_cycles_until_shutdown() {
    let router = MockRouter::new(&["usb0"]);
    let mut poll_loop = PollLoop::new(
        engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead),
        INTERVAL,
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(async move { poll_loop.run(shutdown_rx).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(()).unwrap();

    let result = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert!(router.fetch_count() >= 2);
}

#[tokio::test]
async fn shutdown_interrupts_pause() {
    let router = MockRouter::new(&["usb0"]);
    let mut poll_loop = PollLoop::new(
        engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead),
        Duration::from_secs(3600),
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(async move { poll_loop.run(shutdown_rx).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();

    let result = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(router.fetch_count(), 1);
}

#[tokio::test]
async fn shutdown_abandons_cycle_in_flight() {
    let router = MockRouter::new(&["usb0", "usb1"]);
    router.deliver(unread("usb0", "1", "+100"));
    router.hang_fetches();
    let action = MockAction::new();
    let mut poll_loop = PollLoop::new(
        engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead),
        INTERVAL,
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(async move { poll_loop.run(shutdown_rx).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();

    let result = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(router.fetch_count(), 1);
    assert_eq!(action.accept_count(), 0);
    assert!(router.state_calls().is_empty());
}

#[tokio::test]
async fn closed_shutdown_channel_stops_loop() {
    let router = MockRouter::new(&["usb0"]);
    let mut poll_loop = PollLoop::new(
        engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead),
        INTERVAL,
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    drop(shutdown_tx);

    let result = timeout(Duration::from_secs(1), poll_loop.run(shutdown_rx))
        .await
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn fatal_cycle_stops_loop_with_error() {
    let router = MockRouter::new(&["usb0"]);
    router.fail_fetch("usb0", Failure::Unreachable);
    let mut poll_loop = PollLoop::new(
        engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead),
        INTERVAL,
    );
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let result = timeout(Duration::from_secs(1), poll_loop.run(shutdown_rx))
        .await
        .unwrap();

    assert!(matches!(result, Err(CourierError::RouterUnreachable { .. })));
    assert_eq!(router.fetch_count(), DEFAULT_OUTAGE_LIMIT);
}

#[tokio::test]
async fn run_once_returns_report() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+100"));
    let mut poll_loop = PollLoop::new(
        engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead),
        INTERVAL,
    );

    let report = poll_loop.run_once().await.unwrap();

    assert_eq!(report.accepted, 1);
    assert_eq!(report.reconciled, 1);
    assert_eq!(poll_loop.engine().interfaces(), &["usb0".to_string()]);
}
