use anyhow::{Context, Result};
use log::info;

use crate::auth::Session;
use crate::batch::{BatchOrchestrator, FaultPolicy, ProcessedBatch};
use crate::config::Config;
use crate::date_range::DateRange;
use crate::gmail_client::GmailClient;
use crate::sheets_client::SheetsClient;

/// Runs the order email batch against Gmail and Google Sheets.
pub struct OrderProcessor {
    config: Config,
    policy: FaultPolicy,
}

impl OrderProcessor {
    pub fn new(config: Config, policy: FaultPolicy) -> Self {
        info!("Initializing order email processor ({:?} on faulty email)", policy);
        OrderProcessor { config, policy }
    }

    /// Collect, write to the sheet, then mark the processed emails as read.
    pub async fn process(&self, range: &DateRange) -> Result<ProcessedBatch> {
        info!("Starting order email processing for {}", range);

        let session = Session::new(&self.config).await
            .context("Unable to open Google session")?;
        let gmail = GmailClient::new(&session);
        let sheets = SheetsClient::new(&session, &self.config.spreadsheet_id);

        let batch = BatchOrchestrator::new(&gmail, self.policy)
            .run(range, &sheets, &self.config.sheet_name)
            .await?;

        info!("Processing completed: {} order(s) written and marked as read", batch.len());
        Ok(batch)
    }

    /// Collect and print the batch; no sheet write and no read-marking.
    pub async fn process_dry_run(&self, range: &DateRange) -> Result<ProcessedBatch> {
        println!("\n{}", "=".repeat(80));
        println!("🧪 MODE DRY-RUN - ORDER EMAILS {}", range);
        println!("{}", "=".repeat(80));

        let session = Session::new(&self.config).await
            .context("Unable to open Google session")?;
        let gmail = GmailClient::new(&session);

        let batch = BatchOrchestrator::new(&gmail, self.policy)
            .collect(range)
            .await?;

        for (index, order) in batch.orders.iter().enumerate() {
            println!("📧 Order {}/{} (email ID: {})", index + 1, batch.len(), order.message_id);
            println!("{}", serde_json::to_string_pretty(&order.record)?);
        }

        println!("{}", "=".repeat(80));
        println!(
            "🏁 {} order(s), {} unrelated email(s), {} faulty email(s)",
            batch.len(), batch.skipped, batch.faulty
        );
        println!("{}", "=".repeat(80));

        Ok(batch)
    }
}
