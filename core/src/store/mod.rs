//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Pipelines call store methods — they never execute SQL directly.

mod event;
mod order;
mod promoter;

use crate::{
    error::LedgerResult,
    tier::Tier,
    types::{EventId, OrderId, OrderNumber, PromoterId, TrackingCode},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

pub use crate::payload::OrderItem;

pub struct LedgerStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl LedgerStore {
    pub fn open(path: &str) -> LedgerResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> LedgerResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases this returns a new, isolated database.
    pub fn reopen(&self) -> LedgerResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> LedgerResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Webhook audit log ──────────────────────────────────────

    /// Append one audit row. Append-only: log rows are never updated
    /// or deleted.
    pub fn append_webhook_log(&self, entry: &WebhookLogEntry) -> LedgerResult<i64> {
        self.conn.execute(
            "INSERT INTO webhook_log
             (received_at, webhook_type, order_number, promoter_id, event_id,
              success, error_message, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.received_at,
                entry.webhook_type,
                entry.order_number,
                entry.promoter_id,
                entry.event_id,
                if entry.success { 1i32 } else { 0i32 },
                entry.error_message,
                entry.payload,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn webhook_log_count(&self) -> LedgerResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM webhook_log", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn webhook_logs_for_order(
        &self,
        order_number: &str,
    ) -> LedgerResult<Vec<WebhookLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, received_at, webhook_type, order_number, promoter_id,
                    event_id, success, error_message, payload
             FROM webhook_log WHERE order_number = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![order_number], Self::map_log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All failed deliveries, oldest first. Manual-reconciliation feed.
    pub fn failed_webhook_logs(&self) -> LedgerResult<Vec<WebhookLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, received_at, webhook_type, order_number, promoter_id,
                    event_id, success, error_message, payload
             FROM webhook_log WHERE success = 0
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([], Self::map_log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn latest_webhook_log(&self) -> LedgerResult<Option<WebhookLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, received_at, webhook_type, order_number, promoter_id,
                    event_id, success, error_message, payload
             FROM webhook_log ORDER BY id DESC LIMIT 1",
        )?;
        let row = stmt.query_row([], Self::map_log_row).ok();
        Ok(row)
    }

    fn map_log_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WebhookLogEntry> {
        Ok(WebhookLogEntry {
            id: Some(row.get(0)?),
            received_at: row.get(1)?,
            webhook_type: row.get(2)?,
            order_number: row.get(3)?,
            promoter_id: row.get(4)?,
            event_id: row.get(5)?,
            success: row.get::<_, i32>(6)? != 0,
            error_message: row.get(7)?,
            payload: row.get(8)?,
        })
    }
}

// ── Records ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoterRecord {
    pub promoter_id: PromoterId,
    pub name: String,
    pub tracking_code: TrackingCode,
    pub total_tickets_sold: i64,
    pub total_revenue_generated: f64,
    pub total_commission_earned: f64,
    pub tier: String,
    pub commission_rate: f64,
    /// 1-based position among all promoters by ticket volume. 0 until the
    /// first rank recalculation runs.
    pub rank: i64,
    pub created_at: DateTime<Utc>,
}

impl PromoterRecord {
    /// A freshly onboarded promoter: zero totals, entry tier, unranked.
    pub fn new(promoter_id: &str, name: &str, tracking_code: &str) -> Self {
        let tier = Tier::classify(0);
        Self {
            promoter_id: promoter_id.to_string(),
            name: name.to_string(),
            tracking_code: tracking_code.to_string(),
            total_tickets_sold: 0,
            total_revenue_generated: 0.0,
            total_commission_earned: 0.0,
            tier: tier.label().to_string(),
            commission_rate: tier.rate(),
            rank: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: EventId,
    pub name: String,
    pub total_tickets_sold: i64,
    pub total_revenue: f64,
    pub active: bool,
}

impl EventRecord {
    pub fn new(event_id: &str, name: &str) -> Self {
        Self {
            event_id: event_id.to_string(),
            name: name.to_string(),
            total_tickets_sold: 0,
            total_revenue: 0.0,
            active: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub promoter_id: PromoterId,
    pub event_id: EventId,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub total: f64,
    pub purchaser_name: Option<String>,
    pub purchaser_email: Option<String>,
    pub purchaser_phone: Option<String>,
    pub date_purchased: Option<DateTime<Utc>>,
    /// Frozen at ingestion. Reversal subtracts exactly this value; it is
    /// never recomputed against the promoter's current tier.
    pub commission_earned: f64,
    pub cancelled: bool,
    pub refunded: bool,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Frozen ticket count: one ticket per line item, fixed at ingestion.
    pub fn ticket_count(&self) -> i64 {
        self.items.len() as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLogEntry {
    pub id: Option<i64>,
    pub received_at: DateTime<Utc>,
    pub webhook_type: String,
    pub order_number: OrderNumber,
    pub promoter_id: Option<PromoterId>,
    pub event_id: Option<EventId>,
    pub success: bool,
    pub error_message: Option<String>,
    pub payload: String,
}
