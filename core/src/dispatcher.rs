//! Webhook dispatcher — the single entry point for inbound notifications.
//!
//! Classifies a payload, routes it to ingestion or reversal, and appends
//! exactly one audit row per invocation on every path: success, resolution
//! failure, unknown type, and unparseable payload alike.
//!
//! Concurrency: work is serialized per order number. Ingestion and
//! reversal for the same order can never interleave; different orders
//! contend only on the store itself.

use crate::{
    error::LedgerError,
    ingestion,
    payload::{WebhookKind, WebhookPayload},
    reversal,
    store::{LedgerStore, WebhookLogEntry},
    types::{OrderId, PromoterId},
};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Acknowledgment returned to the webhook sender.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub order_id: Option<OrderId>,
    pub promoter_id: Option<PromoterId>,
    pub commission_earned: Option<f64>,
    pub error: Option<String>,
}

impl DispatchResponse {
    fn acknowledged() -> Self {
        Self {
            success: true,
            order_id: None,
            promoter_id: None,
            commission_earned: None,
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            success: false,
            order_id: None,
            promoter_id: None,
            commission_earned: None,
            error: Some(error),
        }
    }
}

/// Keyed mutual exclusion over order numbers.
struct OrderLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch (or create) the lock guarding one order number.
    // TODO: evict an entry once no waiter holds it; the map grows with
    // distinct order numbers.
    fn for_order(&self, order_number: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(order_number.to_string()).or_default().clone()
    }
}

pub struct WebhookDispatcher {
    store: Mutex<LedgerStore>,
    locks: OrderLocks,
}

impl WebhookDispatcher {
    pub fn new(store: LedgerStore) -> Self {
        Self {
            store: Mutex::new(store),
            locks: OrderLocks::new(),
        }
    }

    /// Direct store access for seeding and queries. Do not hold the guard
    /// across a `dispatch` call.
    pub fn store(&self) -> MutexGuard<'_, LedgerStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Process one inbound payload to completion.
    pub fn dispatch(&self, raw: &serde_json::Value) -> DispatchResponse {
        let received_at = Utc::now();

        let payload = match WebhookPayload::from_value(raw) {
            Ok(p) => p,
            Err(err) => {
                // Unparseable: the order number is unknowable, but the
                // delivery still gets its audit row.
                self.append_log(WebhookLogEntry {
                    id: None,
                    received_at,
                    webhook_type: "unknown".to_string(),
                    order_number: "unknown".to_string(),
                    promoter_id: None,
                    event_id: None,
                    success: false,
                    error_message: Some(err.to_string()),
                    payload: raw.to_string(),
                });
                return DispatchResponse::failure(format!("internal error: {err}"));
            }
        };

        let kind = WebhookKind::classify(&payload);

        // Serialize all work on this order number for the whole call.
        let lock = self.locks.for_order(&payload.order_number);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entry = WebhookLogEntry {
            id: None,
            received_at,
            webhook_type: payload.webhook_type.clone(),
            order_number: payload.order_number.clone(),
            promoter_id: None,
            event_id: None,
            success: false,
            error_message: None,
            payload: raw.to_string(),
        };

        let response = match kind {
            WebhookKind::NewOrder => {
                let store = self.store();
                match ingestion::ingest(&store, &payload) {
                    Ok(outcome) => {
                        entry.success = true;
                        entry.promoter_id = Some(outcome.promoter_id.clone());
                        entry.event_id = Some(outcome.event_id.clone());
                        DispatchResponse {
                            success: true,
                            order_id: Some(outcome.order_id),
                            promoter_id: Some(outcome.promoter_id),
                            commission_earned: Some(outcome.commission_earned),
                            error: None,
                        }
                    }
                    Err(err) => {
                        entry.error_message = Some(err.to_string());
                        DispatchResponse::failure(describe(&err))
                    }
                }
            }
            WebhookKind::OrderUpdate => {
                let store = self.store();
                match reversal::reverse(&store, &payload) {
                    Ok(outcome) => {
                        entry.success = true;
                        entry.promoter_id = Some(outcome.promoter_id.clone());
                        entry.event_id = Some(outcome.event_id.clone());
                        DispatchResponse {
                            success: true,
                            order_id: Some(outcome.order_id),
                            promoter_id: Some(outcome.promoter_id),
                            commission_earned: None,
                            error: None,
                        }
                    }
                    Err(err) => {
                        entry.error_message = Some(err.to_string());
                        DispatchResponse::failure(describe(&err))
                    }
                }
            }
            WebhookKind::Unknown => {
                // Unrecognized but harmless. Acknowledge so the platform
                // does not retry forever; the log row records the miss.
                log::warn!(
                    "unknown webhook type '{}' for order {}",
                    payload.webhook_type,
                    payload.order_number
                );
                entry.error_message = Some("Unknown webhook type".to_string());
                DispatchResponse::acknowledged()
            }
        };

        self.append_log(entry);
        response
    }

    fn append_log(&self, entry: WebhookLogEntry) {
        let store = self.store();
        if let Err(err) = store.append_webhook_log(&entry) {
            // The audit write never blocks the acknowledgment.
            log::error!(
                "failed to append webhook log for order {}: {err}",
                entry.order_number
            );
        }
    }
}

/// Resolution failures read as not-found; everything else is internal.
fn describe(err: &LedgerError) -> String {
    if err.is_not_found() {
        err.to_string()
    } else {
        format!("internal error: {err}")
    }
}
