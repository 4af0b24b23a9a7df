use anyhow::{Context, Result};
use futures::future::BoxFuture;
use log::{debug, info};

use crate::order::{OrderRecord, COLUMN_LABELS};

/// Last column of the 13-column layout.
const LAST_COLUMN: char = 'M';

/// Row of the first order; row 1 holds the header.
pub const FIRST_DATA_ROW: usize = 2;

/// One row of values to write at an A1-notation range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub range: String,
    pub values: Vec<String>,
}

/// Spreadsheet operations used to publish a batch.
pub trait OrderSink: Send + Sync {
    /// Overwrite a single row.
    fn update_row<'a>(&'a self, update: RowUpdate) -> BoxFuture<'a, Result<()>>;

    /// Write many rows in one request.
    fn batch_update<'a>(&'a self, updates: Vec<RowUpdate>) -> BoxFuture<'a, Result<()>>;
}

/// `Sheet!A{row}:M{row}`
pub fn row_range(sheet_name: &str, row: usize) -> String {
    format!("{}!A{}:{}{}", sheet_name, row, LAST_COLUMN, row)
}

pub fn header_update(sheet_name: &str) -> RowUpdate {
    RowUpdate {
        range: row_range(sheet_name, 1),
        values: COLUMN_LABELS.iter().map(|label| label.to_string()).collect(),
    }
}

/// Updates for `records`, the first one landing on `FIRST_DATA_ROW`.
pub fn record_updates(sheet_name: &str, records: &[OrderRecord]) -> Vec<RowUpdate> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| RowUpdate {
            range: row_range(sheet_name, index + FIRST_DATA_ROW),
            values: record.to_row().iter().map(|value| value.to_string()).collect(),
        })
        .collect()
}

/// Write the header row, then every record, to `sheet_name`.
pub async fn write_records<S: OrderSink + ?Sized>(sink: &S, sheet_name: &str, records: &[OrderRecord]) -> Result<()> {
    info!("Writing header and {} order row(s) to sheet '{}'", records.len(), sheet_name);

    sink.update_row(header_update(sheet_name))
        .await
        .context("Unable to write header row")?;

    let updates = record_updates(sheet_name, records);
    if updates.is_empty() {
        debug!("No order rows to write");
        return Ok(());
    }

    sink.batch_update(updates)
        .await
        .context("Unable to write order rows")?;

    info!("✅ {} order row(s) written to '{}'", records.len(), sheet_name);
    Ok(())
}
