//! Order reversal pipeline.
//!
//! Undoes a previously ingested order when a cancellation or refund
//! arrives. The deltas reversed are the ones frozen on the order record —
//! its ticket count and its stored `commission_earned` — so ingestion
//! followed by reversal returns every aggregate to its prior value even
//! if the promoter's tier has moved in between.

use crate::{
    error::{LedgerError, LedgerResult},
    payload::WebhookPayload,
    ranking,
    store::LedgerStore,
    tier::Tier,
    types::{EventId, OrderId, OrderNumber, PromoterId},
};

#[derive(Debug, Clone)]
pub struct ReversalOutcome {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub promoter_id: PromoterId,
    pub event_id: EventId,
    /// False when the update carried nothing to reverse, or the order was
    /// already in a terminal state.
    pub applied: bool,
    pub message: String,
}

pub fn reverse(store: &LedgerStore, payload: &WebhookPayload) -> LedgerResult<ReversalOutcome> {
    let mut order = store
        .get_order_by_order_number(&payload.order_number)?
        .ok_or_else(|| LedgerError::OrderNotFound {
            order_number: payload.order_number.clone(),
        })?;

    let mut promoter = store.get_promoter_by_id(&order.promoter_id)?.ok_or_else(|| {
        LedgerError::DataIntegrity {
            detail: format!(
                "order {} references missing promoter {}",
                order.order_number, order.promoter_id
            ),
        }
    })?;
    let mut event =
        store
            .get_event_by_id(&order.event_id)?
            .ok_or_else(|| LedgerError::DataIntegrity {
                detail: format!(
                    "order {} references missing event {}",
                    order.order_number, order.event_id
                ),
            })?;

    let wants_cancel = payload.cancelled;
    let wants_refund = payload.refunded;

    if !wants_cancel && !wants_refund {
        return Ok(ReversalOutcome {
            order_id: order.order_id,
            order_number: order.order_number,
            promoter_id: promoter.promoter_id,
            event_id: event.event_id,
            applied: false,
            message: "no cancellation or refund flag set; nothing to apply".to_string(),
        });
    }

    // The ledger effect is reversed at most once per order, whichever
    // terminal flag arrives first. A later flag still lands on the order
    // record, but the aggregates stay put.
    if order.cancelled || order.refunded {
        let newly_flagged = (wants_cancel && !order.cancelled) || (wants_refund && !order.refunded);
        if newly_flagged {
            order.cancelled |= wants_cancel;
            order.refunded |= wants_refund;
            store.update_order(&order)?;
        }
        log::info!(
            "order {} already reversed; duplicate terminal notification ignored",
            order.order_number
        );
        return Ok(ReversalOutcome {
            order_id: order.order_id,
            order_number: order.order_number,
            promoter_id: promoter.promoter_id,
            event_id: event.event_id,
            applied: false,
            message: "order already reversed; totals unchanged".to_string(),
        });
    }

    let ticket_count = order.ticket_count();

    promoter.total_tickets_sold -= ticket_count;
    promoter.total_revenue_generated -= order.subtotal;
    promoter.total_commission_earned -= order.commission_earned;
    let tier = Tier::classify(promoter.total_tickets_sold);
    promoter.tier = tier.label().to_string();
    promoter.commission_rate = tier.rate();

    event.total_tickets_sold -= ticket_count;
    event.total_revenue -= order.subtotal;

    order.cancelled |= wants_cancel;
    order.refunded |= wants_refund;

    store.apply_reversal(&promoter, &event, &order)?;
    ranking::recalculate_ranks(store)?;

    let message = format!(
        "reversed {ticket_count} tickets, ${:.2} revenue, ${:.2} commission for order {}",
        order.subtotal, order.commission_earned, order.order_number
    );
    log::info!("{message}; promoter {} now {}", promoter.promoter_id, tier.label());

    Ok(ReversalOutcome {
        order_id: order.order_id,
        order_number: order.order_number,
        promoter_id: promoter.promoter_id,
        event_id: event.event_id,
        applied: true,
        message,
    })
}
