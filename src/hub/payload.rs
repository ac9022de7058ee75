use std::sync::Arc;

/// An opaque broadcast payload.
///
/// The hub never inspects or re-frames it; the transport decides how text and
/// binary bodies go on the wire. Both variants are reference counted, so the
/// clone handed to each member during fan-out does not copy the body.
///
/// # Example
///
/// ```rust
/// use connhub::hub::Payload;
///
/// let msg = Payload::text("{\"temp\":25}");
/// assert_eq!(msg.len(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(Arc<str>),
    Binary(Arc<[u8]>),
}

impl Payload {
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Payload::Text(text.into())
    }

    pub fn binary(bytes: impl Into<Arc<[u8]>>) -> Self {
        Payload::Binary(bytes.into())
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::binary(bytes)
    }
}
