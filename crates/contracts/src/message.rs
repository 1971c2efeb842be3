//! Message - inbound/outbound message model
//!
//! Messages are opaque envelopes. The only thing the distributor needs to
//! know is whether an envelope is a handler registration, and that decision
//! is made here, once, when the message enters the system.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Head tag that marks a handler registration envelope.
pub const REGISTER_HANDLER_TAG: &str = "ES_REGISTER_HANDLER";

/// A message delivered to (or published by) the distributor.
///
/// The envelope bytes are carried verbatim; the distributor never decodes
/// or rewrites them. `Bytes` makes broadcast clones reference-counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "envelope", rename_all = "snake_case")]
pub enum Message {
    /// Ordinary event, routed to a single consumer
    Event(Bytes),
    /// Handler registration, broadcast to every consumer
    RegisterHandler(Bytes),
}

impl Message {
    /// Create an ordinary event
    pub fn event(envelope: impl Into<Bytes>) -> Self {
        Self::Event(envelope.into())
    }

    /// Create a handler registration
    pub fn register_handler(envelope: impl Into<Bytes>) -> Self {
        Self::RegisterHandler(envelope.into())
    }

    /// Classify a decoded envelope by its head tag.
    ///
    /// `head` is the first element of a pair-shaped envelope, or `None` when
    /// the envelope is not a pair at all. Anything other than
    /// [`REGISTER_HANDLER_TAG`] is an ordinary event.
    pub fn classify(head: Option<&str>, envelope: impl Into<Bytes>) -> Self {
        match head {
            Some(REGISTER_HANDLER_TAG) => Self::RegisterHandler(envelope.into()),
            _ => Self::Event(envelope.into()),
        }
    }

    /// Whether this is a handler registration
    pub fn is_registration(&self) -> bool {
        matches!(self, Self::RegisterHandler(_))
    }

    /// Raw envelope bytes
    pub fn envelope(&self) -> &Bytes {
        match self {
            Self::Event(b) | Self::RegisterHandler(b) => b,
        }
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::RegisterHandler(_) => "register_handler",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_registration() {
        let msg = Message::classify(Some("ES_REGISTER_HANDLER"), "handler-a");
        assert!(msg.is_registration());
        assert_eq!(msg.envelope().as_ref(), b"handler-a");
    }

    #[test]
    fn test_classify_other_heads_are_events() {
        assert!(!Message::classify(Some("ES_EVENT"), "x").is_registration());
        assert!(!Message::classify(Some("es_register_handler"), "x").is_registration());
        assert!(!Message::classify(None, "x").is_registration());
    }

    #[test]
    fn test_clone_shares_envelope() {
        let msg = Message::event(vec![1u8, 2, 3]);
        let copy = msg.clone();
        assert_eq!(msg.envelope().as_ptr(), copy.envelope().as_ptr());
    }

    #[test]
    fn test_serde_tagging() {
        let msg = Message::register_handler("h");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "register_handler");

        let parsed: Message = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, msg);
    }
}
