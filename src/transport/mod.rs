//! Transport module - concrete [`crate::RawInvoker`] implementations.
//!
//! Ships the in-process loopback transport; remote transports live in
//! application code and only need to implement the `RawInvoker` seam.

mod loopback;

pub use loopback::{BackendContext, LoopbackInvoker, Request};
