use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use log::debug;

use super::error::ParseError;
use super::message::RawMessage;
use super::parser;
use super::record::OrderRecord;

pub const CONFIRMATION_SUBJECT_PREFIX: &str = "【Yahoo!ショッピング】ご注文の確認";
pub const CANCELLATION_SUBJECT_PREFIX: &str = "【Yahoo!ショッピング】ご注文のキャンセル";

const PLAIN_TEXT: &str = "text/plain";

// Gmail emits url-safe base64 with or without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Confirmation,
    Cancellation,
}

impl OrderKind {
    /// Kind for a subject, by exact prefix. `None` for anything else.
    pub fn from_subject(subject: &str) -> Option<Self> {
        if subject.starts_with(CONFIRMATION_SUBJECT_PREFIX) {
            Some(OrderKind::Confirmation)
        } else if subject.starts_with(CANCELLATION_SUBJECT_PREFIX) {
            Some(OrderKind::Cancellation)
        } else {
            None
        }
    }
}

/// A relevant email with its decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedMessage {
    pub kind: OrderKind,
    /// `To` header, verbatim.
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
}

/// Decide whether `message` is an order email and pull out the body to parse.
///
/// Confirmations are read from the first `text/plain` part, cancellations from
/// the top-level payload. Returns `Ok(None)` for every other subject, including
/// a missing `Subject` header.
pub fn classify_and_extract_body(message: &RawMessage) -> Result<Option<ClassifiedMessage>, ParseError> {
    let Some(subject) = message.header("Subject") else {
        debug!("Message {} has no Subject header", message.id);
        return Ok(None);
    };

    let Some(kind) = OrderKind::from_subject(subject) else {
        debug!("Message {} ignored: {}", message.id, subject);
        return Ok(None);
    };

    let encoded = match kind {
        OrderKind::Confirmation => message
            .first_part(PLAIN_TEXT)
            .and_then(|part| part.body.as_deref())
            .ok_or(ParseError::MissingTextPart)?,
        OrderKind::Cancellation => message.body.as_deref().ok_or(ParseError::MissingBody)?,
    };

    debug!("Message {} classified as {:?}", message.id, kind);

    Ok(Some(ClassifiedMessage {
        kind,
        recipient_email: message.header("To").unwrap_or_default().to_string(),
        subject: subject.to_string(),
        body: decode_body(encoded)?,
    }))
}

/// Classify `message` and parse its body into a full order record.
///
/// An order email whose body has no order date is an error.
pub fn extract_order(message: &RawMessage) -> Result<Option<OrderRecord>, ParseError> {
    let Some(classified) = classify_and_extract_body(message)? else {
        return Ok(None);
    };

    let mut record = parser::parse_body(&classified.body)?;
    if record.order_date.is_empty() {
        // Every order email carries a 注文日時 line.
        return Err(ParseError::OrderDate { value: String::new() });
    }
    record.recipient_email = classified.recipient_email;
    record.subject = classified.subject;

    Ok(Some(record))
}

/// Decode a base64url payload into UTF-8 text.
pub fn decode_body(encoded: &str) -> Result<String, ParseError> {
    let bytes = URL_SAFE_LENIENT.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Encode a payload the way Gmail transmits it.
pub fn encode_body(data: impl AsRef<[u8]>) -> String {
    base64::engine::general_purpose::URL_SAFE.encode(data)
}
