//! Inbound webhook payload schema and routing classification.
//!
//! The ticketing platform delivers a parsed JSON document. Everything the
//! engine consumes goes through `WebhookPayload::from_value` — a strict
//! serde decode — so missing or mistyped fields surface as
//! `MalformedPayload` instead of being silently coerced downstream.

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A purchased line item, snapshotted verbatim onto the order record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: String,
    pub name: String,
    pub price: f64,
}

/// The structured payload the platform posts for every order notification.
///
/// `type` and `order_number` are required for all notifications. The rest
/// is optional at decode time; `new_order_fields` enforces what a new
/// order must additionally carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub webhook_type: String,
    pub order_number: String,
    #[serde(default)]
    pub tracking_link: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub purchaser_name: Option<String>,
    #[serde(default)]
    pub purchaser_email: Option<String>,
    #[serde(default)]
    pub purchaser_phone: Option<String>,
    #[serde(default)]
    pub date_purchased: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub refunded: bool,
    /// Sent by the platform; the ledger does not consume it.
    #[serde(default, rename = "partialRefund")]
    pub partial_refund: Option<f64>,
}

impl WebhookPayload {
    /// Strict decode from an already-parsed JSON document.
    pub fn from_value(raw: &serde_json::Value) -> LedgerResult<WebhookPayload> {
        serde_json::from_value(raw.clone()).map_err(|e| LedgerError::MalformedPayload {
            detail: e.to_string(),
        })
    }

    /// Validate and project the fields a `new_order` must carry.
    pub fn new_order_fields(&self) -> LedgerResult<NewOrderFields<'_>> {
        let tracking_code = self.tracking_link.as_deref().ok_or_else(|| {
            LedgerError::MalformedPayload {
                detail: format!("new_order '{}' missing tracking_link", self.order_number),
            }
        })?;
        let event_id = self
            .event_id
            .as_deref()
            .ok_or_else(|| LedgerError::MalformedPayload {
                detail: format!("new_order '{}' missing event_id", self.order_number),
            })?;
        let items = self
            .items
            .as_deref()
            .ok_or_else(|| LedgerError::MalformedPayload {
                detail: format!("new_order '{}' missing items", self.order_number),
            })?;
        let subtotal = self.subtotal.ok_or_else(|| LedgerError::MalformedPayload {
            detail: format!("new_order '{}' missing subtotal", self.order_number),
        })?;
        let total = self.total.unwrap_or(subtotal);
        Ok(NewOrderFields {
            tracking_code,
            event_id,
            items,
            subtotal,
            total,
        })
    }
}

/// Borrowed view of a validated `new_order` payload.
pub struct NewOrderFields<'a> {
    pub tracking_code: &'a str,
    pub event_id: &'a str,
    pub items: &'a [OrderItem],
    pub subtotal: f64,
    pub total: f64,
}

/// Where a payload routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    /// `type == "new_order"` → ingestion.
    NewOrder,
    /// `type == "order_updated"`, or a cancellation/refund flag is set →
    /// the reversal-capable update path.
    OrderUpdate,
    /// Anything else. Harmless: logged and acknowledged, never an error.
    Unknown,
}

impl WebhookKind {
    pub fn classify(payload: &WebhookPayload) -> WebhookKind {
        if payload.webhook_type == "new_order" {
            WebhookKind::NewOrder
        } else if payload.webhook_type == "order_updated" || payload.cancelled || payload.refunded {
            WebhookKind::OrderUpdate
        } else {
            WebhookKind::Unknown
        }
    }
}
