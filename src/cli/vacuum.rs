//! CLI `vacuum` command: purge orphaned rows, then compact the database file.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use jotter::config::JotterConfig;
use jotter::error::StoreError;
use jotter::store::VacuumReport;

/// Run a vacuum pass on a blocking thread. Ctrl-C cancels it; a cancelled
/// pass removes nothing.
pub async fn vacuum(config: &JotterConfig, json: bool) -> Result<()> {
    let store = Arc::new(super::open_store(config)?);
    let cancel = CancellationToken::new();

    let watcher = {
        let cancel = cancel.clone();
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling vacuum");
                cancel.cancel();
                store.interrupt();
            }
        })
    };

    let worker = {
        let cancel = cancel.clone();
        let store = Arc::clone(&store);
        tokio::task::spawn_blocking(move || store.vacuum(&cancel))
    };
    let outcome = worker.await.context("vacuum task panicked")?;
    watcher.abort();

    match outcome {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
                println!("Vacuum complete.");
            }
            Ok(())
        }
        Err(StoreError::Cancelled) => {
            println!("Vacuum cancelled. No rows were removed.");
            Ok(())
        }
        Err(StoreError::PartialMaintenance { report, source }) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
                println!("Orphans removed, but compaction failed: {source}");
            }
            Err(anyhow::anyhow!("compaction failed: {source}"))
        }
        Err(e) => Err(anyhow::Error::new(e).context("vacuum failed")),
    }
}

fn print_report(report: &VacuumReport) {
    println!("{:<16} {}", "Table", "Deleted");
    println!("{}", "-".repeat(24));
    for step in &report.steps {
        println!("{:<16} {}", step.table, step.deleted);
    }
    println!("{}", "-".repeat(24));
    println!("{:<16} {}", "total", report.total());
}
