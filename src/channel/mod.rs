//! Ordered channel - reassembles an unordered message stream.
//!
//! A [`Channel`] is the receiving end of one logical stream pushed by a
//! remote sender. The transport underneath delivers messages at least once
//! and in no particular order; each message carries its position in the
//! emission order (see [`Envelope`]), and the channel presents them to a
//! single consumer callback exactly once, in strictly increasing index
//! order, with no gaps.
//!
//! Construction eagerly leases an identifier from a [`CallbackRegistry`];
//! the caller embeds that identifier in a request so the remote side knows
//! where to push. Once every index up to the end marker has been handed to
//! the consumer, the channel releases its identifier on its own - no
//! explicit teardown is needed on the success path. A stream that never
//! ends can be abandoned early with [`Channel::close`], which releases the
//! identifier unconditionally; without either, the registration stays
//! alive for the life of the registry.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chanwire::{CallbackRegistry, Channel};
//!
//! let registry = Arc::new(CallbackRegistry::new());
//! let channel = Channel::with_handler(&registry, |msg| {
//!     println!("next message: {msg}");
//! });
//!
//! // channel.id() now goes into a request body; the remote sender
//! // addresses stream messages to it through the registry.
//! let _ = channel.id();
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::registry::{CallbackRegistry, ChannelId};

mod envelope;
mod sender;

pub use envelope::{Envelope, EnvelopeKind};
pub use sender::ChannelSender;

/// Consumer callback receiving decoded message payloads.
pub type MessageHandler = Box<dyn FnMut(Value) + Send>;

/// Per-stream reassembly state. One lock, held only between consumer
/// callback invocations - never while the callback runs.
struct ChannelState {
    /// Current consumer callback.
    handler: MessageHandler,
    /// Bumped on every handler reassignment, so a delivery in flight can
    /// tell whether the callback it borrowed was replaced underneath it.
    handler_generation: u64,
    /// Next index the stream must produce before anything else is
    /// delivered. Starts at 0 and never decreases.
    next_index: u64,
    /// Messages that arrived ahead of `next_index`, keyed by index.
    /// At most one entry per index; a later arrival overwrites.
    pending: BTreeMap<u64, Value>,
    /// Index at which the stream is fully delivered, once known.
    end_index: Option<u64>,
    /// Set on drain or explicit close; nothing is delivered afterwards.
    closed: bool,
}

/// State shared between the [`Channel`] handle and the closure registered
/// with the callback registry.
struct ChannelCore {
    /// Identifier leased from the registry. Set once, right after
    /// registration returns it.
    id: OnceLock<ChannelId>,
    /// Weak so the registry's own handler table entry does not keep the
    /// registry alive through itself.
    registry: Weak<CallbackRegistry>,
    /// Serializes raw-message processing; reassembly assumes one arrival
    /// is handled at a time.
    gate: Mutex<()>,
    state: Mutex<ChannelState>,
}

impl ChannelCore {
    fn lock_state(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release the registry lease, if both still exist.
    fn release(&self) {
        if let (Some(registry), Some(&id)) = (self.registry.upgrade(), self.id.get()) {
            registry.unregister(id);
        }
    }
}

/// Entry point for raw messages addressed to this channel's identifier.
fn on_raw_message(core: &ChannelCore, raw: &[u8]) {
    let parsed: Envelope = match serde_json::from_slice(raw) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!("dropping undecodable channel message: {}", err);
            return;
        }
    };

    let _gate = core.gate.lock().unwrap_or_else(PoisonError::into_inner);
    match parsed.into_kind() {
        EnvelopeKind::End { index } => on_end(core, index),
        EnvelopeKind::Data { index, message } => on_data(core, index, message),
        EnvelopeKind::Malformed => {
            tracing::warn!("dropping channel envelope with neither payload nor end sentinel");
        }
    }
}

fn on_end(core: &ChannelCore, index: u64) {
    let terminal = {
        let mut st = core.lock_state();
        if st.closed {
            return;
        }
        if index == st.next_index {
            // Nothing outstanding: the stream is fully delivered.
            st.closed = true;
            st.pending.clear();
            true
        } else {
            // The marker raced ahead of data still in flight. Remember
            // where the stream ends; the data path re-checks on every
            // advance.
            st.end_index = Some(index);
            false
        }
    };
    if terminal {
        core.release();
    }
}

fn on_data(core: &ChannelCore, index: u64, message: Value) {
    {
        let mut st = core.lock_state();
        if st.closed {
            return;
        }
        match index.cmp(&st.next_index) {
            Ordering::Less => {
                // Already consumed this slot; re-delivering would break
                // exactly-once.
                tracing::debug!("ignoring duplicate message for delivered index {}", index);
                return;
            }
            Ordering::Greater => {
                st.pending.insert(index, message);
                return;
            }
            Ordering::Equal => {}
        }
    }

    // `message` is the one the stream was waiting for. Deliver it, then
    // drain everything that became consecutive behind it.
    let mut payload = message;
    loop {
        deliver(core, payload);

        let mut st = core.lock_state();
        if st.closed {
            // The consumer closed the channel from inside its callback.
            return;
        }
        st.next_index += 1;
        let next = st.next_index;
        match st.pending.remove(&next) {
            Some(value) => payload = value,
            None => {
                if st.end_index == Some(next) {
                    st.closed = true;
                    drop(st);
                    core.release();
                }
                return;
            }
        }
    }
}

/// Invoke the consumer callback with one payload.
///
/// The callback runs without the state lock held, so it may reassign the
/// handler or close the channel re-entrantly. If it installed a new
/// handler, the borrowed one is not put back.
fn deliver(core: &ChannelCore, payload: Value) {
    let (mut handler, generation) = {
        let mut st = core.lock_state();
        let handler = mem::replace(&mut st.handler, Box::new(|_| {}));
        (handler, st.handler_generation)
    };

    handler(payload);

    let mut st = core.lock_state();
    if st.handler_generation == generation {
        st.handler = handler;
    }
}

/// The receiving end of one ordered stream.
///
/// See the [module documentation](self) for the delivery contract.
pub struct Channel {
    id: ChannelId,
    core: Arc<ChannelCore>,
    registry: Arc<CallbackRegistry>,
}

impl Channel {
    /// Create a channel with no consumer callback yet; messages delivered
    /// before [`Channel::set_handler`] is called are silently discarded,
    /// not replayed.
    pub fn new(registry: &Arc<CallbackRegistry>) -> Self {
        Self::build(registry, Box::new(|_| {}))
    }

    /// Create a channel delivering to `handler`.
    pub fn with_handler<F>(registry: &Arc<CallbackRegistry>, handler: F) -> Self
    where
        F: FnMut(Value) + Send + 'static,
    {
        Self::build(registry, Box::new(handler))
    }

    fn build(registry: &Arc<CallbackRegistry>, handler: MessageHandler) -> Self {
        let core = Arc::new(ChannelCore {
            id: OnceLock::new(),
            registry: Arc::downgrade(registry),
            gate: Mutex::new(()),
            state: Mutex::new(ChannelState {
                handler,
                handler_generation: 0,
                next_index: 0,
                pending: BTreeMap::new(),
                end_index: None,
                closed: false,
            }),
        });

        let id = {
            let core = Arc::clone(&core);
            registry.register(move |raw| on_raw_message(&core, &raw))
        };
        let _ = core.id.set(id);

        Self {
            id,
            core,
            registry: Arc::clone(registry),
        }
    }

    /// The identifier the remote sender addresses this stream to.
    #[inline]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Replace the consumer callback.
    ///
    /// Affects only future deliveries, including buffered messages that
    /// become deliverable later; nothing already delivered is replayed.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: FnMut(Value) + Send + 'static,
    {
        let mut st = self.core.lock_state();
        st.handler = Box::new(handler);
        st.handler_generation = st.handler_generation.wrapping_add(1);
    }

    /// Replace the consumer callback with one receiving payloads decoded
    /// into `T`. Payloads that do not match the expected shape are dropped
    /// with a warning.
    pub fn set_json_handler<T, F>(&self, mut handler: F)
    where
        T: DeserializeOwned + 'static,
        F: FnMut(T) + Send + 'static,
    {
        self.set_handler(move |payload| match serde_json::from_value::<T>(payload) {
            Ok(value) => handler(value),
            Err(err) => {
                tracing::warn!("dropping channel message of unexpected shape: {}", err);
            }
        });
    }

    /// Abandon the stream: release the identifier unconditionally and stop
    /// delivering, whether or not the end marker ever arrived. Idempotent.
    pub fn close(&self) {
        {
            let mut st = self.core.lock_state();
            if st.closed {
                return;
            }
            st.closed = true;
            st.pending.clear();
        }
        self.registry.unregister(self.id);
    }

    /// Whether the stream has been fully delivered or explicitly closed.
    pub fn is_closed(&self) -> bool {
        self.core.lock_state().closed
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A channel argument serializes to its tagged identifier, so the remote
/// side recognizes it as a stream reference rather than an opaque value.
impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}
