use thiserror::Error;

/// Faults raised while turning one fetched email into an order record.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("body is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("order date '{value}' is not in 'YYYY年MM月DD日 HH時MM分SS秒' form")]
    OrderDate { value: String },

    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("confirmation email has no text/plain part")]
    MissingTextPart,

    #[error("cancellation email has no body payload")]
    MissingBody,
}
