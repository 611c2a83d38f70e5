//! Global promoter ranking.
//!
//! Full recompute, not incremental: every invocation fetches all
//! promoters, orders them, and rewrites every rank. At promoter-population
//! scale the simplicity wins over an incremental scheme.

use crate::{error::LedgerResult, store::LedgerStore, types::PromoterId};

/// Rewrite the 1-based rank of every promoter.
///
/// Safe to invoke repeatedly; must run after any mutation that changes a
/// promoter's ticket total.
pub fn recalculate_ranks(store: &LedgerStore) -> LedgerResult<()> {
    let mut promoters = store.all_promoters()?;

    // Descending ticket volume; promoter id breaks ties so repeated runs
    // over identical totals always produce the same ordering.
    promoters.sort_by(|a, b| {
        b.total_tickets_sold
            .cmp(&a.total_tickets_sold)
            .then_with(|| a.promoter_id.cmp(&b.promoter_id))
    });

    let ranks: Vec<(PromoterId, i64)> = promoters
        .iter()
        .enumerate()
        .map(|(idx, p)| (p.promoter_id.clone(), idx as i64 + 1))
        .collect();

    store.update_ranks(&ranks)?;
    log::debug!("recalculated ranks for {} promoters", ranks.len());
    Ok(())
}
