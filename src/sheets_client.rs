use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use google_sheets4::api::{BatchUpdateValuesRequest, Scope, ValueRange};
use google_sheets4::Sheets;
use log::{debug, info};

use crate::auth::{HttpsConnector, Session};
use crate::sheet::{OrderSink, RowUpdate};

/// Values are stored as typed, without formula or number parsing.
const VALUE_INPUT_OPTION: &str = "RAW";

pub struct SheetsClient {
    hub: Sheets<HttpsConnector>,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(session: &Session, spreadsheet_id: &str) -> Self {
        SheetsClient {
            hub: Sheets::new(session.client(), session.authenticator()),
            spreadsheet_id: spreadsheet_id.to_string(),
        }
    }

    pub async fn update_values(&self, update: RowUpdate) -> Result<()> {
        debug!("Updating range {}", update.range);

        let range = update.range.clone();
        self.hub
            .spreadsheets()
            .values_update(value_range(update), &self.spreadsheet_id, &range)
            .value_input_option(VALUE_INPUT_OPTION)
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await
            .with_context(|| format!("Unable to update range {}", range))?;

        Ok(())
    }

    pub async fn batch_update_values(&self, updates: Vec<RowUpdate>) -> Result<()> {
        let count = updates.len();
        let request = BatchUpdateValuesRequest {
            value_input_option: Some(VALUE_INPUT_OPTION.to_string()),
            data: Some(updates.into_iter().map(value_range).collect()),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .values_batch_update(request, &self.spreadsheet_id)
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await
            .context("Unable to batch update spreadsheet values")?;

        info!("Batch update of {} range(s) on spreadsheet {}", count, self.spreadsheet_id);
        Ok(())
    }
}

impl OrderSink for SheetsClient {
    fn update_row<'a>(&'a self, update: RowUpdate) -> BoxFuture<'a, Result<()>> {
        self.update_values(update).boxed()
    }

    fn batch_update<'a>(&'a self, updates: Vec<RowUpdate>) -> BoxFuture<'a, Result<()>> {
        self.batch_update_values(updates).boxed()
    }
}

fn value_range(update: RowUpdate) -> ValueRange {
    ValueRange {
        range: Some(update.range),
        values: Some(vec![update.values.into_iter().map(serde_json::Value::String).collect()]),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_is_one_row_of_strings() {
        let range = value_range(RowUpdate {
            range: "Sheet1!A2:M2".to_string(),
            values: vec!["A".to_string(), "".to_string()],
        });

        assert_eq!(range.range.as_deref(), Some("Sheet1!A2:M2"));
        let values = range.values.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], vec![serde_json::json!("A"), serde_json::json!("")]);
    }
}
