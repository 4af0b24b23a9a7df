/// Email representation returned by the mailbox: headers plus a body that is
/// either a single payload or a list of typed parts.
///
/// Payloads are kept in their wire form (base64url text) and decoded by the
/// classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub id: String,
    pub headers: Vec<Header>,
    /// Top-level payload, base64url encoded.
    pub body: Option<String>,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    pub mime_type: String,
    /// Base64url encoded payload.
    pub body: Option<String>,
}

impl RawMessage {
    /// Value of the named header. When the header appears more than once the
    /// last occurrence wins. Names are compared exactly.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|header| header.name == name)
            .map(|header| header.value.as_str())
    }

    /// First part declared exactly as `mime_type`.
    pub fn first_part(&self, mime_type: &str) -> Option<&MessagePart> {
        self.parts.iter().find(|part| part.mime_type == mime_type)
    }
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }
}
