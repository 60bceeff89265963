//! Sending end of a channel, used by backend functions.
//!
//! A [`ChannelSender`] stamps each outgoing payload with the next index in
//! emission order and posts it through the registry to the receiving
//! channel. [`ChannelSender::close`] emits the end marker carrying the
//! total message count, after which the stream counts as fully delivered
//! once the receiver has consumed every index below it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::channel::Envelope;
use crate::error::{Result, WireError};
use crate::registry::{CallbackRegistry, ChannelId};

/// Pushes an ordered stream of messages to one channel identifier.
pub struct ChannelSender {
    registry: Arc<CallbackRegistry>,
    id: ChannelId,
    /// Index stamped on the next data message.
    next_index: AtomicU64,
    closed: AtomicBool,
}

impl ChannelSender {
    /// Create a sender addressing `id` through `registry`.
    pub fn new(registry: Arc<CallbackRegistry>, id: ChannelId) -> Self {
        Self {
            registry,
            id,
            next_index: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// The identifier this sender pushes to.
    #[inline]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Send one message. Serialization failures surface here; an absent
    /// receiver does not - a receiver that tore down early makes the
    /// message undeliverable noise, not an error.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(WireError::ChannelClosed);
        }
        let payload = serde_json::to_value(message)?;
        let index = self.next_index.fetch_add(1, Ordering::SeqCst);
        self.post(Envelope::data(index, payload))
    }

    /// Emit the end marker. Further sends fail with
    /// [`WireError::ChannelClosed`]; closing again is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let index = self.next_index.load(Ordering::SeqCst);
        self.post(Envelope::end_marker(index))
    }

    fn post(&self, envelope: Envelope) -> Result<()> {
        let raw = Bytes::from(serde_json::to_vec(&envelope)?);
        if !self.registry.dispatch(self.id, raw) {
            tracing::debug!("channel {} has no receiver, message dropped", self.id.raw());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::channel::Channel;

    #[test]
    fn test_sender_delivers_in_emission_order() {
        let registry = Arc::new(CallbackRegistry::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = received.clone();
        let channel = Channel::with_handler(&registry, move |msg: Value| {
            sink.lock().unwrap().push(msg);
        });

        let sender = ChannelSender::new(Arc::clone(&registry), channel.id());
        sender.send("one").unwrap();
        sender.send("two").unwrap();
        sender.send("three").unwrap();
        sender.close().unwrap();

        assert_eq!(
            *received.lock().unwrap(),
            vec![json!("one"), json!("two"), json!("three")]
        );
        assert!(channel.is_closed());
        assert!(!registry.is_registered(channel.id()));
    }

    #[test]
    fn test_close_without_sends_drains_immediately() {
        let registry = Arc::new(CallbackRegistry::new());
        let channel = Channel::with_handler(&registry, |_| panic!("nothing was sent"));

        let sender = ChannelSender::new(Arc::clone(&registry), channel.id());
        sender.close().unwrap();

        assert!(channel.is_closed());
        assert!(!registry.is_registered(channel.id()));
    }

    #[test]
    fn test_send_after_close_is_rejected() {
        let registry = Arc::new(CallbackRegistry::new());
        let channel = Channel::new(&registry);

        let sender = ChannelSender::new(Arc::clone(&registry), channel.id());
        sender.close().unwrap();
        sender.close().unwrap(); // no-op

        let err = sender.send(&1).unwrap_err();
        assert!(matches!(err, WireError::ChannelClosed));
    }

    #[test]
    fn test_send_to_departed_receiver_is_not_an_error() {
        let registry = Arc::new(CallbackRegistry::new());
        let channel = Channel::new(&registry);
        let id = channel.id();
        channel.close();

        let sender = ChannelSender::new(Arc::clone(&registry), id);
        assert!(sender.send("into the void").is_ok());
    }
}
