use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::date_range::DateRange;
use crate::mailbox::{Mailbox, SearchQuery, MARK_READ_BATCH_LIMIT};
use crate::order::{extract_order, OrderRecord};
use crate::sheet::{self, OrderSink};

/// What to do when one message cannot be decoded or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Stop the run; nothing is written and nothing is marked read.
    #[default]
    Abort,
    /// Log the fault and carry on; the message is neither recorded nor marked read.
    SkipMessage,
}

/// An order record together with the message that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedOrder {
    pub message_id: String,
    pub record: OrderRecord,
}

/// Orders collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedBatch {
    pub orders: Vec<ProcessedOrder>,
    pub skipped: usize,
    pub faulty: usize,
}

impl ProcessedBatch {
    pub fn push(&mut self, message_id: String, record: OrderRecord) {
        self.orders.push(ProcessedOrder { message_id, record });
    }

    /// Stable sort by `(order_date, order_id)`, plain string comparison.
    pub fn sort(&mut self) {
        self.orders.sort_by(|a, b| a.record.sort_key().cmp(&b.record.sort_key()));
    }

    pub fn records(&self) -> Vec<OrderRecord> {
        self.orders.iter().map(|order| order.record.clone()).collect()
    }

    pub fn message_ids(&self) -> Vec<String> {
        self.orders.iter().map(|order| order.message_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Outcome of marking a run's messages as read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkReadSummary {
    pub chunks_marked: usize,
    pub chunks_failed: usize,
}

/// Runs search, extraction, sheet write and read-marking for one date range.
pub struct BatchOrchestrator<'a, M: Mailbox + ?Sized> {
    mailbox: &'a M,
    policy: FaultPolicy,
}

impl<'a, M: Mailbox + ?Sized> BatchOrchestrator<'a, M> {
    pub fn new(mailbox: &'a M, policy: FaultPolicy) -> Self {
        BatchOrchestrator { mailbox, policy }
    }

    /// Search, fetch and parse every candidate message, returning the sorted batch.
    /// Nothing is written and no message state changes.
    pub async fn collect(&self, range: &DateRange) -> Result<ProcessedBatch> {
        let (after, before) = range.unix_bounds()?;
        let query = SearchQuery::orders_between(after, before);

        info!("Searching order emails for {} ({})", range, query.to_gmail_query());

        let message_ids = self.mailbox.search(&query)
            .await
            .context("Error searching for order emails")?;

        info!("Found {} candidate email(s)", message_ids.len());

        let mut batch = ProcessedBatch::default();

        for (index, message_id) in message_ids.into_iter().enumerate() {
            debug!("Email {} (ID: {})", index + 1, message_id);

            let message = self.mailbox.fetch(&message_id)
                .await
                .with_context(|| format!("Unable to fetch email {}", message_id))?;

            match extract_order(&message) {
                Ok(Some(record)) => {
                    debug!("Email {} -> order '{}' ({})", message_id, record.order_id, record.order_date);
                    batch.push(message_id, record);
                }
                Ok(None) => {
                    batch.skipped += 1;
                }
                Err(e) => match self.policy {
                    FaultPolicy::Abort => {
                        return Err(e).with_context(|| format!("Unable to extract order from email {}", message_id));
                    }
                    FaultPolicy::SkipMessage => {
                        warn!("Skipping email {}: {}", message_id, e);
                        batch.faulty += 1;
                    }
                },
            }
        }

        batch.sort();

        info!(
            "Extracted {} order(s), {} unrelated email(s) skipped, {} faulty",
            batch.len(), batch.skipped, batch.faulty
        );

        Ok(batch)
    }

    /// Collect the batch, write it to `sheet_name`, then mark its messages as read.
    ///
    /// Read-marking happens even when the sheet write fails; the write error is
    /// returned afterwards. Those messages will not be selected again if the
    /// mailbox search skips read mail, so their rows are lost.
    pub async fn run<S: OrderSink + ?Sized>(&self, range: &DateRange, sink: &S, sheet_name: &str) -> Result<ProcessedBatch> {
        let batch = self.collect(range).await?;

        let write_result = sheet::write_records(sink, sheet_name, &batch.records()).await;
        if let Err(e) = &write_result {
            error!("Sheet write failed, emails are still marked as read: {:#}", e);
        }

        if !batch.is_empty() {
            mark_read_in_chunks(self.mailbox, &batch.message_ids()).await;
        }

        write_result?;
        Ok(batch)
    }
}

/// Mark `message_ids` as read in sequential chunks of `MARK_READ_BATCH_LIMIT`.
/// A failed chunk is logged and the remaining chunks are still attempted.
pub async fn mark_read_in_chunks<M: Mailbox + ?Sized>(mailbox: &M, message_ids: &[String]) -> MarkReadSummary {
    let mut summary = MarkReadSummary::default();

    for chunk in message_ids.chunks(MARK_READ_BATCH_LIMIT) {
        match mailbox.mark_read(chunk).await {
            Ok(()) => {
                debug!("Marked {} email(s) as read", chunk.len());
                summary.chunks_marked += 1;
            }
            Err(e) => {
                error!("Error marking {} email(s) as read: {:#}", chunk.len(), e);
                summary.chunks_failed += 1;
            }
        }
    }

    info!(
        "Read-marking done: {} chunk(s) marked, {} failed",
        summary.chunks_marked, summary.chunks_failed
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_date: &str, order_id: &str) -> OrderRecord {
        OrderRecord {
            order_date: order_date.to_string(),
            order_id: order_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sort_by_date_then_id() {
        let mut batch = ProcessedBatch::default();
        batch.push("m-b".into(), record("2024/01/02", "B"));
        batch.push("m-a".into(), record("2024/01/01", "A"));

        batch.sort();

        let ids: Vec<_> = batch.records().into_iter().map(|r| r.order_id).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(batch.message_ids(), ["m-a", "m-b"]);
    }

    #[test]
    fn test_sort_is_lexicographic_with_empty_first() {
        let mut batch = ProcessedBatch::default();
        batch.push("1".into(), record("2024/01/01", "10"));
        batch.push("2".into(), record("2024/01/01", "9"));
        batch.push("3".into(), record("", "Z"));
        batch.push("4".into(), record("2024/01/01", ""));

        batch.sort();

        assert_eq!(batch.message_ids(), ["3", "4", "1", "2"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut batch = ProcessedBatch::default();
        batch.push("first".into(), record("2024/01/01", "A"));
        batch.push("second".into(), record("2024/01/01", "A"));

        batch.sort();

        assert_eq!(batch.message_ids(), ["first", "second"]);
    }
}
