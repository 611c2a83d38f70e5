//! Shared primitive types used across the ledger.

/// Stable identifier for a promoter.
pub type PromoterId = String;

/// Stable identifier for a ticketed event.
pub type EventId = String;

/// Internal identifier for an order record.
pub type OrderId = String;

/// The ticketing platform's external order number. Idempotency key:
/// at most one order record ever exists per order number.
pub type OrderNumber = String;

/// A promoter's unique referral code, carried on inbound orders as
/// `tracking_link`.
pub type TrackingCode = String;
