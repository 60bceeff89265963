//! Wire envelope for channel messages.
//!
//! Inbound raw messages come in exactly two shapes:
//!
//! ```text
//! { "index": N, "message": <payload> }   data at index N
//! { "index": N, "end": true }            no data will be sent past index N
//! ```
//!
//! The presence of the `end` field is the sentinel; its value is not
//! inspected. Anything else is a malformed envelope and is dropped by the
//! channel without touching its counters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One channel message as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Position of this message in the emission order.
    pub index: u64,
    /// Application payload; absent on end markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    /// End-of-stream sentinel; presence is what matters, not the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<bool>,
}

/// Classified envelope, consumed by the channel state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeKind {
    /// Data at an index.
    Data { index: u64, message: Value },
    /// End marker: the stream is fully delivered once every index below
    /// `index` has been handed to the consumer.
    End { index: u64 },
    /// Neither payload nor sentinel present.
    Malformed,
}

impl Envelope {
    /// Build a data envelope.
    pub fn data(index: u64, message: Value) -> Self {
        Self {
            index,
            message: Some(message),
            end: None,
        }
    }

    /// Build an end marker.
    pub fn end_marker(index: u64) -> Self {
        Self {
            index,
            message: None,
            end: Some(true),
        }
    }

    /// Classify the envelope. The end sentinel wins over a payload if a
    /// broken sender ever sets both.
    pub fn into_kind(self) -> EnvelopeKind {
        if self.end.is_some() {
            return EnvelopeKind::End { index: self.index };
        }
        match self.message {
            Some(message) => EnvelopeKind::Data {
                index: self.index,
                message,
            },
            None => EnvelopeKind::Malformed,
        }
    }
}
