use super::{EventRecord, LedgerStore};
use crate::error::LedgerResult;
use rusqlite::params;

impl LedgerStore {
    pub fn insert_event(&self, e: &EventRecord) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO event (event_id, name, total_tickets_sold, total_revenue, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                e.event_id,
                e.name,
                e.total_tickets_sold,
                e.total_revenue,
                if e.active { 1i32 } else { 0i32 },
            ],
        )?;
        Ok(())
    }

    pub fn get_event_by_id(&self, event_id: &str) -> LedgerResult<Option<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, name, total_tickets_sold, total_revenue, active
             FROM event WHERE event_id = ?1",
        )?;
        let row = stmt.query_row(params![event_id], Self::map_event_row).ok();
        Ok(row)
    }

    pub fn update_event(&self, e: &EventRecord) -> LedgerResult<()> {
        self.conn.execute(
            "UPDATE event SET name = ?2, total_tickets_sold = ?3, total_revenue = ?4, active = ?5
             WHERE event_id = ?1",
            params![
                e.event_id,
                e.name,
                e.total_tickets_sold,
                e.total_revenue,
                if e.active { 1i32 } else { 0i32 },
            ],
        )?;
        Ok(())
    }

    pub fn event_count(&self) -> LedgerResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM event", [], |row| row.get(0))
            .map_err(Into::into)
    }

    fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRecord> {
        Ok(EventRecord {
            event_id: row.get(0)?,
            name: row.get(1)?,
            total_tickets_sold: row.get(2)?,
            total_revenue: row.get(3)?,
            active: row.get::<_, i32>(4)? != 0,
        })
    }
}
