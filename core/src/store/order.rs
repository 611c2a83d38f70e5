use super::{EventRecord, LedgerStore, OrderRecord, PromoterRecord};
use crate::error::LedgerResult;
use rusqlite::params;

impl LedgerStore {
    pub fn insert_order(&self, o: &OrderRecord) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO orders (
                order_id, order_number, promoter_id, event_id, items_json,
                subtotal, total, purchaser_name, purchaser_email, purchaser_phone,
                date_purchased, commission_earned, cancelled, refunded, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                o.order_id,
                o.order_number,
                o.promoter_id,
                o.event_id,
                serde_json::to_string(&o.items)?,
                o.subtotal,
                o.total,
                o.purchaser_name,
                o.purchaser_email,
                o.purchaser_phone,
                o.date_purchased,
                o.commission_earned,
                if o.cancelled { 1i32 } else { 0i32 },
                if o.refunded { 1i32 } else { 0i32 },
                o.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_order_by_order_number(
        &self,
        order_number: &str,
    ) -> LedgerResult<Option<OrderRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT order_id, order_number, promoter_id, event_id, items_json,
                    subtotal, total, purchaser_name, purchaser_email, purchaser_phone,
                    date_purchased, commission_earned, cancelled, refunded, created_at
             FROM orders WHERE order_number = ?1",
        )?;
        let row = stmt
            .query_row(params![order_number], Self::map_order_row)
            .ok();
        Ok(row)
    }

    /// Rewrite an order's terminal flags. Snapshot fields never change
    /// after ingestion, so only the flags are touched.
    pub fn update_order(&self, o: &OrderRecord) -> LedgerResult<()> {
        self.conn.execute(
            "UPDATE orders SET cancelled = ?2, refunded = ?3 WHERE order_id = ?1",
            params![
                o.order_id,
                if o.cancelled { 1i32 } else { 0i32 },
                if o.refunded { 1i32 } else { 0i32 },
            ],
        )?;
        Ok(())
    }

    pub fn order_count(&self) -> LedgerResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
            .map_err(Into::into)
    }

    // ── Atomic multi-entity applies ────────────────────────────
    //
    // One inbound webhook mutates up to three entities. Each apply wraps
    // them in a single transaction so a concurrent reader (the ranking
    // sweep in particular) never observes a partial delta.

    /// Persist a freshly ingested order together with the updated
    /// promoter and event aggregates.
    pub fn apply_ingestion(
        &self,
        promoter: &PromoterRecord,
        event: &EventRecord,
        order: &OrderRecord,
    ) -> LedgerResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.insert_order(order)?;
        self.update_promoter(promoter)?;
        self.update_event(event)?;
        tx.commit()?;
        Ok(())
    }

    /// Persist a reversal: the order's terminal flags plus the restored
    /// promoter and event aggregates.
    pub fn apply_reversal(
        &self,
        promoter: &PromoterRecord,
        event: &EventRecord,
        order: &OrderRecord,
    ) -> LedgerResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.update_order(order)?;
        self.update_promoter(promoter)?;
        self.update_event(event)?;
        tx.commit()?;
        Ok(())
    }

    fn map_order_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderRecord> {
        let items_json: String = row.get(4)?;
        let items = serde_json::from_str(&items_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(OrderRecord {
            order_id: row.get(0)?,
            order_number: row.get(1)?,
            promoter_id: row.get(2)?,
            event_id: row.get(3)?,
            items,
            subtotal: row.get(5)?,
            total: row.get(6)?,
            purchaser_name: row.get(7)?,
            purchaser_email: row.get(8)?,
            purchaser_phone: row.get(9)?,
            date_purchased: row.get(10)?,
            commission_earned: row.get(11)?,
            cancelled: row.get::<_, i32>(12)? != 0,
            refunded: row.get::<_, i32>(13)? != 0,
            created_at: row.get(14)?,
        })
    }
}
