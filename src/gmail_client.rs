use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use google_gmail1::api::{BatchModifyMessagesRequest, Message, Scope};
use google_gmail1::Gmail;
use log::{debug, info};

use crate::auth::{HttpsConnector, Session};
use crate::mailbox::{Mailbox, SearchQuery};
use crate::order::classifier::encode_body;
use crate::order::{Header, MessagePart, RawMessage};

const USER_ID: &str = "me";
const UNREAD_LABEL: &str = "UNREAD";

pub struct GmailClient {
    hub: Gmail<HttpsConnector>,
}

impl GmailClient {
    pub fn new(session: &Session) -> Self {
        GmailClient {
            hub: Gmail::new(session.client(), session.authenticator()),
        }
    }

    pub async fn search_order_emails(&self, query: &SearchQuery) -> Result<Vec<String>> {
        let q = query.to_gmail_query();
        debug!("Search criteria: {}", q);

        let mut message_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut call = self.hub
                .users()
                .messages_list(USER_ID)
                .q(&q)
                .add_scope(Scope::Modify);
            if let Some(token) = &page_token {
                call = call.page_token(token);
            }

            let (_, page) = call.doit()
                .await
                .context("Error searching for emails")?;

            message_ids.extend(page.messages.unwrap_or_default().into_iter().filter_map(|msg| msg.id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!("Found {} email(s) for '{}'", message_ids.len(), q);
        Ok(message_ids)
    }

    pub async fn fetch_message(&self, message_id: &str) -> Result<RawMessage> {
        debug!("Retrieving email ID: {}", message_id);

        let (_, message) = self.hub
            .users()
            .messages_get(USER_ID, message_id)
            .format("full")
            .add_scope(Scope::Modify)
            .doit()
            .await
            .with_context(|| format!("Unable to retrieve email {}", message_id))?;

        Ok(raw_message_from_api(message_id, message))
    }

    pub async fn mark_as_read(&self, message_ids: &[String]) -> Result<()> {
        info!("Marking {} email(s) as read", message_ids.len());

        let request = BatchModifyMessagesRequest {
            ids: Some(message_ids.to_vec()),
            remove_label_ids: Some(vec![UNREAD_LABEL.to_string()]),
            ..Default::default()
        };

        self.hub
            .users()
            .messages_batch_modify(request, USER_ID)
            .add_scope(Scope::Modify)
            .doit()
            .await
            .context("Unable to remove UNREAD label")?;

        Ok(())
    }
}

impl Mailbox for GmailClient {
    fn search<'a>(&'a self, query: &'a SearchQuery) -> BoxFuture<'a, Result<Vec<String>>> {
        self.search_order_emails(query).boxed()
    }

    fn fetch<'a>(&'a self, message_id: &'a str) -> BoxFuture<'a, Result<RawMessage>> {
        self.fetch_message(message_id).boxed()
    }

    fn mark_read<'a>(&'a self, message_ids: &'a [String]) -> BoxFuture<'a, Result<()>> {
        self.mark_as_read(message_ids).boxed()
    }
}

/// Convert a Gmail API message into a `RawMessage`.
///
/// The API client hands back payloads already decoded to bytes; they are put
/// back into base64url text so every mailbox yields the same wire form.
pub fn raw_message_from_api(message_id: &str, message: Message) -> RawMessage {
    let Some(payload) = message.payload else {
        return RawMessage {
            id: message_id.to_string(),
            ..Default::default()
        };
    };

    let headers = payload.headers
        .unwrap_or_default()
        .into_iter()
        .filter_map(|header| match (header.name, header.value) {
            (Some(name), Some(value)) => Some(Header { name, value }),
            _ => None,
        })
        .collect();

    let body = payload.body
        .and_then(|body| body.data)
        .map(encode_body);

    let parts = payload.parts
        .unwrap_or_default()
        .into_iter()
        .map(|part| MessagePart {
            mime_type: part.mime_type.unwrap_or_default(),
            body: part.body
                .and_then(|body| body.data)
                .map(encode_body),
        })
        .collect();

    RawMessage {
        id: message_id.to_string(),
        headers,
        body,
        parts,
    }
}
