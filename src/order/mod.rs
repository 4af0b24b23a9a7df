/// Order email extraction: message model, classification and body parsing
pub mod classifier;
pub mod error;
pub mod message;
pub mod parser;
pub mod record;

pub use classifier::{classify_and_extract_body, extract_order, ClassifiedMessage, OrderKind};
pub use error::ParseError;
pub use message::{Header, MessagePart, RawMessage};
pub use parser::parse_body;
pub use record::{OrderRecord, COLUMN_LABELS};
