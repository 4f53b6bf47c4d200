//! Read messages, access list and skip cache.

use super::harness::{already_read, engine, key, unread, MockAction, MockRouter, RouterCall};
use keensms_config::ReconcilePolicy;

#[tokio::test]
async fn read_messages_are_never_evaluated() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(already_read("usb0", "1", "+100"));
    router.deliver(already_read("usb0", "2", "+999"));
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.already_read, 2);
    assert_eq!(report.rejected, 0);
    assert_eq!(action.accept_count(), 0);
    assert!(engine.skip_cache().is_empty());
    assert!(router.state_calls().is_empty());
}

#[tokio::test]
async fn unauthorized_sender_goes_to_skip_cache() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+999"));
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.rejected, 1);
    assert_eq!(action.accept_count(), 0);
    assert!(engine.skip_cache().contains(&key("usb0", "1")));
    assert!(router.state_calls().is_empty());
    assert!(!router.stored("usb0", "1").unwrap().read);
}

#[tokio::test]
async fn skipped_message_is_a_cache_hit_forever() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+999"));
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::Delete);

    engine.run_cycle().await.unwrap();
    for _ in 0..3 {
        let report = engine.run_cycle().await.unwrap();
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.rejected, 0);
    }

    assert_eq!(engine.skip_cache().len(), 1);
    assert_eq!(action.accept_count(), 0);
    assert!(router.state_calls().is_empty());
}

#[tokio::test]
async fn empty_access_list_accepts_nobody() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(unread("usb0", "1", "+100"));
    router.deliver(unread("usb0", "2", "+200"));
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &[], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.rejected, 2);
    assert_eq!(action.accept_count(), 0);
    assert_eq!(engine.skip_cache().len(), 2);
}

#[tokio::test]
async fn same_id_on_two_interfaces_is_two_messages() {
    let router = MockRouter::new(&["usb0", "usb1"]);
    router.deliver(unread("usb0", "1", "+999"));
    router.deliver(unread("usb1", "1", "+100"));
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    engine.run_cycle().await.unwrap();

    assert!(engine.skip_cache().contains(&key("usb0", "1")));
    assert!(!engine.skip_cache().contains(&key("usb1", "1")));
    assert_eq!(action.accepted(), vec![key("usb1", "1")]);
    assert_eq!(
        router.state_calls(),
        vec![RouterCall::MarkAsRead("usb1".into(), vec!["1".into()])]
    );
}

#[tokio::test]
async fn messages_are_handled_in_interface_then_router_order() {
    let router = MockRouter::new(&["usb1", "usb0"]);
    router.deliver(unread("usb0", "a", "+100"));
    router.deliver(unread("usb1", "c", "+100"));
    router.deliver(unread("usb0", "b", "+100"));
    router.deliver(unread("usb1", "d", "+100"));
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::Leave);

    engine.run_cycle().await.unwrap();

    assert_eq!(
        action.accepted(),
        vec![key("usb1", "c"), key("usb1", "d"), key("usb0", "a"), key("usb0", "b")]
    );
}

#[tokio::test]
async fn mixed_inbox_only_acts_on_authorized_unread() {
    let router = MockRouter::new(&["usb0"]);
    router.deliver(already_read("usb0", "1", "+100"));
    router.deliver(unread("usb0", "2", "+100"));
    router.deliver(unread("usb0", "3", "+999"));
    let action = MockAction::new();
    let mut engine = engine(&router, action.clone(), &["+100"], ReconcilePolicy::MarkRead);

    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.already_read, 1);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(action.accepted(), vec![key("usb0", "2")]);
    assert_eq!(
        router.state_calls(),
        vec![RouterCall::MarkAsRead("usb0".into(), vec!["2".into()])]
    );
}
