//! webhook-runner: headless webhook replay tool for the promoter ledger.
//!
//! Usage:
//!   webhook-runner --db ledger.db --seed seed.json --input payloads.ndjson --summary
//!   cat payloads.ndjson | webhook-runner --summary
//!
//! The input is newline-delimited JSON, one webhook payload per line.
//! The optional seed file onboards promoters and events before replay:
//!   { "promoters": [{"promoter_id": "...", "name": "...", "tracking_code": "..."}],
//!     "events":    [{"event_id": "...", "name": "..."}] }

use anyhow::{Context, Result};
use promoledger_core::{
    dispatcher::WebhookDispatcher,
    store::{EventRecord, LedgerStore, PromoterRecord},
};
use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

#[derive(serde::Deserialize)]
struct SeedFile {
    #[serde(default)]
    promoters: Vec<SeedPromoter>,
    #[serde(default)]
    events: Vec<SeedEvent>,
}

#[derive(serde::Deserialize)]
struct SeedPromoter {
    promoter_id: String,
    name: String,
    tracking_code: String,
}

#[derive(serde::Deserialize)]
struct SeedEvent {
    event_id: String,
    name: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let input = arg_value(&args, "--input").unwrap_or("-");
    let seed_path = arg_value(&args, "--seed");
    let summary = args.iter().any(|a| a == "--summary");

    let store = LedgerStore::open(db)?;
    store.migrate()?;

    if let Some(path) = seed_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {path}"))?;
        let seed: SeedFile = serde_json::from_str(&raw)?;
        for p in &seed.promoters {
            store.insert_promoter(&PromoterRecord::new(
                &p.promoter_id,
                &p.name,
                &p.tracking_code,
            ))?;
        }
        for e in &seed.events {
            store.insert_event(&EventRecord::new(&e.event_id, &e.name))?;
        }
        println!(
            "seeded {} promoters, {} events",
            seed.promoters.len(),
            seed.events.len()
        );
    }

    let dispatcher = WebhookDispatcher::new(store);

    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(
            File::open(input).with_context(|| format!("opening input {input}"))?,
        ))
    };

    let mut accepted = 0u64;
    let mut rejected = 0u64;
    let mut unreadable = 0u64;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("line {}: not valid JSON: {err}", lineno + 1);
                unreadable += 1;
                continue;
            }
        };
        let response = dispatcher.dispatch(&raw);
        if response.success {
            accepted += 1;
        } else {
            rejected += 1;
            log::warn!(
                "line {}: {}",
                lineno + 1,
                response.error.as_deref().unwrap_or("rejected")
            );
        }
    }

    println!("webhook-runner: {accepted} accepted, {rejected} rejected, {unreadable} unreadable");

    if summary {
        let store = dispatcher.store();
        println!();
        println!(
            "{:>4}  {:<20} {:<12} {:>8} {:>12} {:>12}  tier",
            "rank", "promoter", "code", "tickets", "revenue", "commission"
        );
        for p in store.all_promoters_ranked()? {
            println!(
                "{:>4}  {:<20} {:<12} {:>8} {:>12.2} {:>12.2}  {}",
                p.rank,
                p.name,
                p.tracking_code,
                p.total_tickets_sold,
                p.total_revenue_generated,
                p.total_commission_earned,
                p.tier
            );
        }

        let failures = store.failed_webhook_logs()?;
        if !failures.is_empty() {
            println!();
            println!("{} failed deliveries need manual review:", failures.len());
            for f in &failures {
                println!(
                    "  [{}] {} {}: {}",
                    f.id.unwrap_or(0),
                    f.webhook_type,
                    f.order_number,
                    f.error_message.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
