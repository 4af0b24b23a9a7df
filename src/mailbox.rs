use anyhow::Result;
use futures::future::BoxFuture;

use crate::order::RawMessage;

/// Sender of Yahoo!ショッピング order notifications.
pub const ORDER_SENDER: &str = "shopping-order-master@mail.yahoo.co.jp";

/// Largest number of ids accepted by one mark-as-read call.
pub const MARK_READ_BATCH_LIMIT: usize = 1000;

/// Search criteria: one sender and a half-open unix time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub sender: String,
    /// Inclusive lower bound.
    pub after: i64,
    /// Exclusive upper bound.
    pub before: i64,
}

impl SearchQuery {
    pub fn orders_between(after: i64, before: i64) -> Self {
        SearchQuery {
            sender: ORDER_SENDER.to_string(),
            after,
            before,
        }
    }

    /// Gmail search syntax for this query.
    pub fn to_gmail_query(&self) -> String {
        format!("from:{} after:{} before:{}", self.sender, self.after, self.before)
    }
}

/// Mail provider operations used by a batch run.
pub trait Mailbox: Send + Sync {
    /// Ids of messages matching `query`. Order is not significant.
    fn search<'a>(&'a self, query: &'a SearchQuery) -> BoxFuture<'a, Result<Vec<String>>>;

    /// Full message for `message_id`.
    fn fetch<'a>(&'a self, message_id: &'a str) -> BoxFuture<'a, Result<RawMessage>>;

    /// Clear the unread flag on up to `MARK_READ_BATCH_LIMIT` messages.
    fn mark_read<'a>(&'a self, message_ids: &'a [String]) -> BoxFuture<'a, Result<()>>;
}
