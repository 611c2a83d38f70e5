//! Order ingestion pipeline.
//!
//! Applies a `new_order` notification: resolves the promoter and event,
//! computes the commission, persists the order, and rolls the deltas into
//! both aggregates atomically. Any resolution failure short-circuits
//! without touching the store.

use crate::{
    error::{LedgerError, LedgerResult},
    payload::WebhookPayload,
    ranking,
    store::{LedgerStore, OrderRecord},
    tier::Tier,
    types::{EventId, OrderId, PromoterId},
};
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct IngestionOutcome {
    pub order_id: OrderId,
    pub promoter_id: PromoterId,
    pub event_id: EventId,
    pub commission_earned: f64,
    /// True when the order number had already been ingested and this
    /// delivery applied nothing.
    pub duplicate: bool,
}

pub fn ingest(store: &LedgerStore, payload: &WebhookPayload) -> LedgerResult<IngestionOutcome> {
    // Order numbers are the idempotency key: a repeat delivery echoes the
    // stored order and applies nothing.
    if let Some(existing) = store.get_order_by_order_number(&payload.order_number)? {
        log::info!(
            "duplicate delivery of order {}; already ingested as {}",
            payload.order_number,
            existing.order_id
        );
        return Ok(IngestionOutcome {
            order_id: existing.order_id,
            promoter_id: existing.promoter_id,
            event_id: existing.event_id,
            commission_earned: existing.commission_earned,
            duplicate: true,
        });
    }

    let fields = payload.new_order_fields()?;

    let mut promoter = store
        .get_promoter_by_tracking_code(fields.tracking_code)?
        .ok_or_else(|| LedgerError::PromoterNotFound {
            tracking_code: fields.tracking_code.to_string(),
        })?;
    let mut event =
        store
            .get_event_by_id(fields.event_id)?
            .ok_or_else(|| LedgerError::EventNotFound {
                event_id: fields.event_id.to_string(),
            })?;

    let ticket_count = fields.items.len() as i64;

    // Commission is earned at the tier this sale graduates the promoter
    // into, not the tier they walked in with. A single large order
    // qualifies for its own upgraded rate.
    let projected_tickets = promoter.total_tickets_sold + ticket_count;
    let tier = Tier::classify(projected_tickets);
    let commission = fields.subtotal * tier.rate();

    let order = OrderRecord {
        order_id: Uuid::new_v4().to_string(),
        order_number: payload.order_number.clone(),
        promoter_id: promoter.promoter_id.clone(),
        event_id: event.event_id.clone(),
        items: fields.items.to_vec(),
        subtotal: fields.subtotal,
        total: fields.total,
        purchaser_name: payload.purchaser_name.clone(),
        purchaser_email: payload.purchaser_email.clone(),
        purchaser_phone: payload.purchaser_phone.clone(),
        date_purchased: payload.date_purchased,
        commission_earned: commission,
        cancelled: false,
        refunded: false,
        created_at: Utc::now(),
    };

    promoter.total_tickets_sold = projected_tickets;
    promoter.total_revenue_generated += fields.subtotal;
    promoter.total_commission_earned += commission;
    promoter.tier = tier.label().to_string();
    promoter.commission_rate = tier.rate();

    event.total_tickets_sold += ticket_count;
    event.total_revenue += fields.subtotal;

    store.apply_ingestion(&promoter, &event, &order)?;
    ranking::recalculate_ranks(store)?;

    log::info!(
        "ingested order {}: {ticket_count} tickets, ${:.2} subtotal, ${commission:.2} commission at {} for promoter {}",
        order.order_number,
        fields.subtotal,
        tier.label(),
        promoter.promoter_id
    );

    Ok(IngestionOutcome {
        order_id: order.order_id,
        promoter_id: promoter.promoter_id,
        event_id: event.event_id,
        commission_earned: commission,
        duplicate: false,
    })
}
