//! Integration tests for the order reversal pipeline:
//! exact restoration, idempotent cancellation, frozen commission, and
//! failure cases.

use promoledger_core::{
    dispatcher::WebhookDispatcher,
    store::{EventRecord, LedgerStore, PromoterRecord},
};
use serde_json::json;

const TOL: f64 = 1e-9;

fn build() -> WebhookDispatcher {
    let store = LedgerStore::in_memory().expect("in-memory store");
    store.migrate().expect("migrate");
    store
        .insert_promoter(&PromoterRecord::new("pr-1", "Avery Quinn", "AVERY10"))
        .unwrap();
    store
        .insert_event(&EventRecord::new("ev-1", "Harbor Lights Festival"))
        .unwrap();
    WebhookDispatcher::new(store)
}

fn new_order(order_number: &str, tickets: usize, subtotal: f64) -> serde_json::Value {
    let items: Vec<_> = (0..tickets)
        .map(|i| {
            json!({
                "item_id": format!("itm-{i}"),
                "name": "General Admission",
                "price": subtotal / tickets as f64,
            })
        })
        .collect();
    json!({
        "type": "new_order",
        "order_number": order_number,
        "tracking_link": "AVERY10",
        "event_id": "ev-1",
        "items": items,
        "subtotal": subtotal,
        "total": subtotal,
        "purchaser_name": "Jordan Li",
        "purchaser_email": "jordan@example.com",
        "date_purchased": "2026-05-01T18:30:00Z",
    })
}

fn cancellation(order_number: &str) -> serde_json::Value {
    json!({
        "type": "order_updated",
        "order_number": order_number,
        "cancelled": true,
        "refunded": false,
    })
}

fn refund(order_number: &str) -> serde_json::Value {
    json!({
        "type": "order_updated",
        "order_number": order_number,
        "cancelled": false,
        "refunded": true,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: ingest then cancel returns every aggregate to its prior value
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cancellation_restores_prior_state_exactly() {
    let dispatcher = build();

    assert!(dispatcher.dispatch(&new_order("ORD-1", 10, 450.0)).success);
    let resp = dispatcher.dispatch(&cancellation("ORD-1"));
    assert!(resp.success, "reversal failed: {:?}", resp.error);

    let store = dispatcher.store();
    let p = store
        .get_promoter_by_tracking_code("AVERY10")
        .unwrap()
        .unwrap();
    assert_eq!(p.total_tickets_sold, 0);
    assert!(p.total_revenue_generated.abs() < TOL);
    assert!(p.total_commission_earned.abs() < TOL);
    assert_eq!(p.tier, "Bronze");

    let e = store.get_event_by_id("ev-1").unwrap().unwrap();
    assert_eq!(e.total_tickets_sold, 0);
    assert!(e.total_revenue.abs() < TOL);

    let o = store.get_order_by_order_number("ORD-1").unwrap().unwrap();
    assert!(o.cancelled);
    assert!(!o.refunded);
    // The frozen snapshot survives the reversal.
    assert!((o.commission_earned - 90.0).abs() < TOL);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: a refund reverses the same way a cancellation does
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn refund_reverses_ledger_effect() {
    let dispatcher = build();

    assert!(dispatcher.dispatch(&new_order("ORD-2", 6, 300.0)).success);
    assert!(dispatcher.dispatch(&refund("ORD-2")).success);

    let store = dispatcher.store();
    let p = store
        .get_promoter_by_tracking_code("AVERY10")
        .unwrap()
        .unwrap();
    assert_eq!(p.total_tickets_sold, 0);
    assert!(p.total_commission_earned.abs() < TOL);

    let o = store.get_order_by_order_number("ORD-2").unwrap().unwrap();
    assert!(o.refunded);
    assert!(!o.cancelled);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: reversal is idempotent
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn double_cancellation_is_a_noop() {
    let dispatcher = build();

    assert!(dispatcher.dispatch(&new_order("ORD-3", 8, 400.0)).success);
    assert!(dispatcher.dispatch(&cancellation("ORD-3")).success);
    let resp = dispatcher.dispatch(&cancellation("ORD-3"));
    assert!(resp.success, "repeat cancellation must be acknowledged");

    let store = dispatcher.store();
    let p = store
        .get_promoter_by_tracking_code("AVERY10")
        .unwrap()
        .unwrap();
    // Totals must not go negative on the second delivery.
    assert_eq!(p.total_tickets_sold, 0);
    assert!(p.total_revenue_generated.abs() < TOL);
    assert!(p.total_commission_earned.abs() < TOL);

    let e = store.get_event_by_id("ev-1").unwrap().unwrap();
    assert_eq!(e.total_tickets_sold, 0);
}

#[test]
fn refund_after_cancellation_does_not_double_reverse() {
    let dispatcher = build();

    assert!(dispatcher.dispatch(&new_order("ORD-4", 5, 250.0)).success);
    assert!(dispatcher.dispatch(&cancellation("ORD-4")).success);
    assert!(dispatcher.dispatch(&refund("ORD-4")).success);

    let store = dispatcher.store();
    let p = store
        .get_promoter_by_tracking_code("AVERY10")
        .unwrap()
        .unwrap();
    assert_eq!(p.total_tickets_sold, 0);
    assert!(p.total_commission_earned.abs() < TOL);

    // The refund flag still lands on the order record.
    let o = store.get_order_by_order_number("ORD-4").unwrap().unwrap();
    assert!(o.cancelled);
    assert!(o.refunded);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: reversal subtracts the frozen commission, never a recomputed one
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn reversal_uses_frozen_commission() {
    let dispatcher = build();

    // 20 tickets at Bronze: commission 80.
    assert!(dispatcher.dispatch(&new_order("ORD-5a", 20, 400.0)).success);
    // 5 tickets crossing into Silver: commission 25, frozen on the order.
    assert!(dispatcher.dispatch(&new_order("ORD-5b", 5, 100.0)).success);
    // 30 tickets pushing the promoter to Gold: commission 180.
    assert!(dispatcher.dispatch(&new_order("ORD-5c", 30, 600.0)).success);

    // Cancelling the Silver-era order must subtract its frozen 25, not
    // 100 * the promoter's current Gold rate.
    assert!(dispatcher.dispatch(&cancellation("ORD-5b")).success);

    let store = dispatcher.store();
    let p = store
        .get_promoter_by_tracking_code("AVERY10")
        .unwrap()
        .unwrap();
    assert_eq!(p.total_tickets_sold, 50);
    assert!((p.total_revenue_generated - 1000.0).abs() < TOL);
    assert!((p.total_commission_earned - 260.0).abs() < TOL);
    assert_eq!(p.tier, "Gold");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: failure and no-op cases
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cancelling_unknown_order_fails() {
    let dispatcher = build();

    let resp = dispatcher.dispatch(&cancellation("ORD-GHOST"));
    assert!(!resp.success);
    assert!(resp.error.unwrap().contains("ORD-GHOST"));

    let store = dispatcher.store();
    let log = store.latest_webhook_log().unwrap().unwrap();
    assert!(!log.success);
    assert_eq!(log.order_number, "ORD-GHOST");
}

#[test]
fn update_without_flags_changes_nothing() {
    let dispatcher = build();

    assert!(dispatcher.dispatch(&new_order("ORD-6", 3, 90.0)).success);
    let resp = dispatcher.dispatch(&json!({
        "type": "order_updated",
        "order_number": "ORD-6",
    }));
    assert!(resp.success);

    let store = dispatcher.store();
    let p = store
        .get_promoter_by_tracking_code("AVERY10")
        .unwrap()
        .unwrap();
    assert_eq!(p.total_tickets_sold, 3);

    let o = store.get_order_by_order_number("ORD-6").unwrap().unwrap();
    assert!(!o.cancelled);
    assert!(!o.refunded);
}
