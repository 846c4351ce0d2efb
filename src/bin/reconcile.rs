//! Post-hoc reconcile: run the full company ↔ invoicing-customer
//! reconciliation and print the triage queue.
//!
//! Reads `~/.salesos/config.json` for the invoicing credentials and opens
//! the working store read-only — link write-backs stay with the server; this
//! binary only reads and reports.

use salesos::config::load_config;
use salesos::db::CrmDb;
use salesos::invoicing::InvoicingClient;
use salesos::matching::MatchThresholds;
use salesos::services::reconcile::bulk_reconcile;
use salesos::types::MatchStatus;

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        eprintln!("reconcile failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = load_config()?.unwrap_or_default();
    let client = InvoicingClient::from_config(config.invoicing.as_ref())
        .map_err(|e| format!("{} — add an invoicing section to ~/.salesos/config.json", e))?;
    let db = CrmDb::open_readonly().map_err(|e| e.to_string())?;

    let results = bulk_reconcile(&db, &client, &MatchThresholds::default())
        .await
        .map_err(|e| e.to_string())?;

    let mut current: Option<MatchStatus> = None;
    for result in &results {
        if current != Some(result.status) {
            current = Some(result.status);
            let heading = match result.status {
                MatchStatus::Suggested => "Suggested links",
                MatchStatus::Unmatched => "No confident match",
                MatchStatus::Linked => "Already linked",
            };
            println!("\n== {} ==", heading);
        }
        println!(
            "  {:>3}  customer {}  →  {}",
            result.score,
            result.external_customer_id,
            result.company_id.as_deref().unwrap_or("-")
        );
    }
    println!("\n{} customers reconciled", results.len());
    Ok(())
}
