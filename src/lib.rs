//! # chanwire
//!
//! Ordered, reassembling message channels and typed invocation over
//! unordered, at-least-once IPC transports.
//!
//! A backend process emits a stream of payloads for one logical
//! subscription; the transport may deliver them out of order, and the
//! end-of-stream marker may overtake data still in flight. `chanwire`
//! presents that stream as a single callback invoked exactly once per
//! message, in emission order, and releases the stream's callback
//! registration on its own once everything up to the end marker has been
//! delivered.
//!
//! ## Architecture
//!
//! - **[`CallbackRegistry`]** - leases process-unique identifiers to
//!   raw-message handlers and routes inbound messages to them.
//! - **[`Channel`]** - the receiving end of one stream: reassembles
//!   indexed messages into strict emission order.
//! - **[`Invoker`]** - typed request/response facade over a [`RawInvoker`]
//!   transport: JSON encoding, reserved function-name header, response
//!   decoding.
//! - **[`LoopbackInvoker`]** - in-process transport wiring the two sides
//!   together; real transports implement [`RawInvoker`] themselves.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chanwire::{CallbackRegistry, Channel, InvokeOptions, Invoker, LoopbackInvoker};
//!
//! let registry = Arc::new(CallbackRegistry::new());
//! let transport = LoopbackInvoker::new(Arc::clone(&registry));
//! let invoker = Invoker::new(transport);
//!
//! // Receive a pushed stream, in order, no matter how it arrives.
//! let progress = Channel::with_handler(&registry, |msg| {
//!     println!("progress: {msg}");
//! });
//!
//! let started: bool = invoker
//!     .invoke(
//!         "start_job",
//!         &serde_json::json!({ "on_progress": progress.id() }),
//!         InvokeOptions::new(),
//!     )
//!     .await?;
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod invoke;
pub mod registry;
pub mod transport;

pub use channel::{Channel, ChannelSender, Envelope};
pub use error::{Result, WireError};
pub use invoke::{Body, BoxFuture, InvokeOptions, Invoker, RawInvoker, ResponseBody};
pub use registry::{CallbackRegistry, ChannelId};
pub use transport::{BackendContext, LoopbackInvoker, Request};
