use super::{LedgerStore, PromoterRecord};
use crate::{error::LedgerResult, types::PromoterId};
use rusqlite::params;

impl LedgerStore {
    pub fn insert_promoter(&self, p: &PromoterRecord) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO promoter (
                promoter_id, name, tracking_code,
                total_tickets_sold, total_revenue_generated, total_commission_earned,
                tier, commission_rate, rank, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                p.promoter_id,
                p.name,
                p.tracking_code,
                p.total_tickets_sold,
                p.total_revenue_generated,
                p.total_commission_earned,
                p.tier,
                p.commission_rate,
                p.rank,
                p.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_promoter_by_tracking_code(
        &self,
        tracking_code: &str,
    ) -> LedgerResult<Option<PromoterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT promoter_id, name, tracking_code,
                    total_tickets_sold, total_revenue_generated, total_commission_earned,
                    tier, commission_rate, rank, created_at
             FROM promoter WHERE tracking_code = ?1",
        )?;
        let row = stmt
            .query_row(params![tracking_code], Self::map_promoter_row)
            .ok();
        Ok(row)
    }

    pub fn get_promoter_by_id(&self, promoter_id: &str) -> LedgerResult<Option<PromoterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT promoter_id, name, tracking_code,
                    total_tickets_sold, total_revenue_generated, total_commission_earned,
                    tier, commission_rate, rank, created_at
             FROM promoter WHERE promoter_id = ?1",
        )?;
        let row = stmt
            .query_row(params![promoter_id], Self::map_promoter_row)
            .ok();
        Ok(row)
    }

    /// Rewrite a promoter's counters and classification. The caller is
    /// responsible for having derived tier/commission_rate from the ticket
    /// total being written.
    pub fn update_promoter(&self, p: &PromoterRecord) -> LedgerResult<()> {
        self.conn.execute(
            "UPDATE promoter SET
                name = ?2, tracking_code = ?3,
                total_tickets_sold = ?4, total_revenue_generated = ?5,
                total_commission_earned = ?6,
                tier = ?7, commission_rate = ?8
             WHERE promoter_id = ?1",
            params![
                p.promoter_id,
                p.name,
                p.tracking_code,
                p.total_tickets_sold,
                p.total_revenue_generated,
                p.total_commission_earned,
                p.tier,
                p.commission_rate,
            ],
        )?;
        Ok(())
    }

    pub fn all_promoters(&self) -> LedgerResult<Vec<PromoterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT promoter_id, name, tracking_code,
                    total_tickets_sold, total_revenue_generated, total_commission_earned,
                    tier, commission_rate, rank, created_at
             FROM promoter",
        )?;
        let rows = stmt
            .query_map([], Self::map_promoter_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Current standings, best rank first.
    pub fn all_promoters_ranked(&self) -> LedgerResult<Vec<PromoterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT promoter_id, name, tracking_code,
                    total_tickets_sold, total_revenue_generated, total_commission_earned,
                    tier, commission_rate, rank, created_at
             FROM promoter ORDER BY rank ASC",
        )?;
        let rows = stmt
            .query_map([], Self::map_promoter_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Persist a full rank rewrite in one transaction, so no reader ever
    /// sees a half-assigned ordering.
    pub fn update_ranks(&self, ranks: &[(PromoterId, i64)]) -> LedgerResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE promoter SET rank = ?2 WHERE promoter_id = ?1")?;
            for (promoter_id, rank) in ranks {
                stmt.execute(params![promoter_id, rank])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn promoter_count(&self) -> LedgerResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM promoter", [], |row| row.get(0))
            .map_err(Into::into)
    }

    fn map_promoter_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PromoterRecord> {
        Ok(PromoterRecord {
            promoter_id: row.get(0)?,
            name: row.get(1)?,
            tracking_code: row.get(2)?,
            total_tickets_sold: row.get(3)?,
            total_revenue_generated: row.get(4)?,
            total_commission_earned: row.get(5)?,
            tier: row.get(6)?,
            commission_rate: row.get(7)?,
            rank: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
