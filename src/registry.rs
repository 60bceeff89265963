//! Callback registry - leases process-unique identifiers to raw-message
//! handlers.
//!
//! The registry is the addressing layer underneath channels: a channel
//! registers one handler at construction and the remote sender addresses
//! every stream message to the returned [`ChannelId`]. IDs are assigned
//! sequentially starting from 1 (0 is reserved).
//!
//! Dispatch never holds the handler table lock while a handler runs, so a
//! handler is free to call [`CallbackRegistry::unregister`] on its own id
//! mid-dispatch. That is the normal teardown path for a drained channel.
//!
//! # Example
//!
//! ```
//! use chanwire::registry::CallbackRegistry;
//! use bytes::Bytes;
//!
//! let registry = CallbackRegistry::new();
//! let id = registry.register(|raw| {
//!     println!("got {} bytes", raw.len());
//! });
//!
//! registry.dispatch(id, Bytes::from_static(b"hello"));
//! registry.unregister(id);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WireError;

/// Tag prefix used for the wire representation of a channel identifier.
///
/// A channel reference embedded in a request body serializes to
/// `__CHANNEL__:<id>` so the remote side can tell it apart from an
/// ordinary number or string.
const CHANNEL_REF_TAG: &str = "__CHANNEL__:";

/// Handle addressing one registered raw-message callback.
///
/// Opaque to callers; the numeric value is only meaningful to the registry
/// that issued it. Serializes to the tagged string form (see
/// [`ChannelId::to_string`]) so it can travel inside a JSON request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u32);

impl ChannelId {
    /// Raw numeric value of the identifier.
    #[inline]
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CHANNEL_REF_TAG}{}", self.0)
    }
}

impl FromStr for ChannelId {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(CHANNEL_REF_TAG)
            .ok_or_else(|| WireError::InvalidChannelRef(s.to_string()))?;
        let raw: u32 = digits
            .parse()
            .map_err(|_| WireError::InvalidChannelRef(s.to_string()))?;
        Ok(ChannelId(raw))
    }
}

impl Serialize for ChannelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Handler invoked with raw inbound messages addressed to one identifier.
pub type RawHandler = dyn Fn(Bytes) + Send + Sync;

/// Registry mapping identifiers to raw-message handlers.
///
/// All methods take `&self`; the registry is intended to be shared behind
/// an [`Arc`] between the local channels and whatever transport feeds
/// inbound messages into [`CallbackRegistry::dispatch`].
pub struct CallbackRegistry {
    /// Registered handlers by id.
    handlers: Mutex<HashMap<u32, Arc<RawHandler>>>,
    /// Next id to lease. Starts at 1, 0 is reserved.
    next_id: AtomicU32,
}

impl CallbackRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<u32, Arc<RawHandler>>> {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler and lease a fresh identifier for it.
    pub fn register<F>(&self, handler: F) -> ChannelId
    where
        F: Fn(Bytes) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.table().insert(id, Arc::new(handler));
        ChannelId(id)
    }

    /// Release an identifier. Returns whether it was still registered.
    ///
    /// Unknown ids are a no-op; releasing twice is fine.
    pub fn unregister(&self, id: ChannelId) -> bool {
        self.table().remove(&id.raw()).is_some()
    }

    /// Whether an identifier currently has a registered handler.
    pub fn is_registered(&self, id: ChannelId) -> bool {
        self.table().contains_key(&id.raw())
    }

    /// Deliver a raw inbound message to the handler leased under `id`.
    ///
    /// Returns `false` when no handler is registered for the id; such
    /// messages are undeliverable noise (e.g. late arrivals for an already
    /// drained channel) and are dropped.
    pub fn dispatch(&self, id: ChannelId, raw: Bytes) -> bool {
        let handler = self.table().get(&id.raw()).cloned();
        match handler {
            Some(handler) => {
                handler(raw);
                true
            }
            None => {
                tracing::debug!("dropping message for unknown callback id {}", id.raw());
                false
            }
        }
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
