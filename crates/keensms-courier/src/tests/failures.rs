//! Contained and fatal failures.

use super::harness::{engine, key, unread, Failure, MockAction, MockRouter, RouterCall};
use crate::engine::DEFAULT_OUTAGE_LIMIT;
use crate::error::CourierError;
use keenetic_client::RouterError;
use keensms_config::ReconcilePolicy;

#[tokio::test]
async fn failed_interface_does_not_stop_others() {
    let router = MockRouter::new(&["usb0", "usb1"]);
    router.deliver(unread("usb0", "1", "+100"));
    router.deliver(unread("usb1", "2", "+100"));
    router.fail_fetch("usb0", Failure::Unreachable);
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.failed_interfaces, vec!["usb0".to_string()]);
    assert_eq!(action.accepted(), vec![key("usb1", "2")]);
    assert_eq!(
        router.state_calls(),
        vec![RouterCall::MarkAsRead("usb1".into(), vec!["2".into()])]
    );
}

#[tokio::test]
async fn failed_interface_is_retried_next_cycle() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+100"));
    router.fail_fetch("usb0", Failure::Command);
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.failed_interfaces.len(), 1);
    assert_eq!(action.accept_count(), 0);

    router.heal_fetch("usb0");
    let report = engine.run_cycle().await.unwrap();
    assert!(report.failed_interfaces.is_empty());
    assert_eq!(action.accepted(), vec![key("usb0", "1")]);
}

#[tokio::test]
async fn total_connectivity_loss_is_fatal_after_outage_limit() {
    let router = MockRouter::new(&["usb0", "usb1"]);
    router.fail_fetch("usb0", Failure::Unreachable);
    router.fail_fetch("usb1", Failure::Unreachable);
    let mut engine = engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead);

    for _ in 1..DEFAULT_OUTAGE_LIMIT {
        let report = engine.run_cycle().await.unwrap();
        assert_eq!(report.failed_interfaces.len(), 2);
    }
    let err = engine.run_cycle().await.unwrap_err();

    assert!(matches!(
        err,
        CourierError::RouterUnreachable { interfaces: 2, cycles } if cycles == DEFAULT_OUTAGE_LIMIT
    ));
    assert!(router.state_calls().is_empty());
}

#[tokio::test]
async fn single_interface_blip_is_not_fatal() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+100"));
    router.fail_fetch("usb0", Failure::Unreachable);
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.failed_interfaces, vec!["usb0".to_string()]);

    router.heal_fetch("usb0");
    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.accepted, 1);
    assert_eq!(action.accepted(), vec![key("usb0", "1")]);
}

#[tokio::test]
async fn recovered_cycle_resets_outage_count() {
    let router = MockRouter::new(&["usb0"]);
    let mut engine =
        engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead).with_outage_limit(2);

    router.fail_fetch("usb0", Failure::Unreachable);
    engine.run_cycle().await.unwrap();
    router.heal_fetch("usb0");
    engine.run_cycle().await.unwrap();

    router.fail_fetch("usb0", Failure::Unreachable);
    engine.run_cycle().await.unwrap();
    let err = engine.run_cycle().await.unwrap_err();
    assert!(matches!(
        err,
        CourierError::RouterUnreachable { interfaces: 1, cycles: 2 }
    ));
}

#[tokio::test]
async fn outage_limit_of_one_is_immediately_fatal() {
    let router = MockRouter::new(&["usb0"]);
    router.fail_fetch("usb0", Failure::Unreachable);
    let mut engine =
        engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead).with_outage_limit(0);

    let err = engine.run_cycle().await.unwrap_err();
    assert!(matches!(err, CourierError::RouterUnreachable { cycles: 1, .. }));
    assert_eq!(router.fetch_count(), 1);
}

#[tokio::test]
async fn command_errors_on_every_interface_are_contained() {
    let router = MockRouter::new(&["usb0", "usb1"]);
    router.fail_fetch("usb0", Failure::Command);
    router.fail_fetch("usb1", Failure::Unreachable);
    let mut engine = engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.failed_interfaces.len(), 2);
}

#[tokio::test]
async fn auth_failure_on_fetch_is_fatal() {
    let router = MockRouter::new(&["usb0", "usb1"]);
    router.deliver(unread("usb1", "1", "+100"));
    router.fail_fetch("usb0", Failure::Auth);
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    let err = engine.run_cycle().await.unwrap_err();

    assert!(matches!(err, CourierError::Router(RouterError::Auth(_))));
    assert_eq!(router.fetch_count(), 1);
    assert_eq!(action.accept_count(), 0);
}

#[tokio::test]
async fn auth_failure_on_reconcile_is_fatal() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+100"));
    router.fail_state_change("usb0", Failure::Auth);
    let mut engine = engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::Delete);

    let err = engine.run_cycle().await.unwrap_err();

    assert!(matches!(err, CourierError::Router(RouterError::Auth(_))));
}

#[tokio::test]
async fn failed_action_is_not_batched_and_retried() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+100"));
    router.deliver(unread("usb0", "2", "+100"));
    let action = MockAction::new();
    action.fail_for(key("usb0", "1"));
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();
    assert_eq!(report.action_failures, 1);
    assert_eq!(report.accepted, 1);
    assert_eq!(
        router.state_calls(),
        vec![RouterCall::MarkAsRead("usb0".into(), vec!["2".into()])]
    );
    assert!(!engine.skip_cache().contains(&key("usb0", "1")));

    action.heal(&key("usb0", "1"));
    router.clear_calls();
    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.accepted, 1);
    assert_eq!(report.already_read, 1);
    assert_eq!(
        router.state_calls(),
        vec![RouterCall::MarkAsRead("usb0".into(), vec!["1".into()])]
    );
}

#[tokio::test]
async fn all_actions_failing_means_no_router_call() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+100"));
    let action = MockAction::new();
    action.fail_next(1);
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::Delete);

    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.action_failures, 1);
    assert!(router.state_calls().is_empty());
}

#[tokio::test]
async fn no_interfaces_is_an_idle_cycle() {
    let router = MockRouter::new(&[]);
    let mut engine = engine(&router, MockAction::new(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();

    assert!(report.is_idle());
    assert_eq!(router.fetch_count(), 0);
}
