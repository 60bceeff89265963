//! Invocation module - typed calls to named backend functions.
//!
//! Provides:
//! - [`RawInvoker`] - the boundary trait for the underlying
//!   request/response transport
//! - [`Invoker`] - the typed facade: JSON encoding, function-name header,
//!   response decoding
//! - [`InvokeOptions`] - per-call header map
//!
//! # Example
//!
//! ```ignore
//! use chanwire::{InvokeOptions, Invoker};
//!
//! let invoker = Invoker::new(transport);
//! let sum: i64 = invoker
//!     .invoke("add", &[1, 2, 3], InvokeOptions::new())
//!     .await?;
//! ```

mod facade;
mod options;

pub use facade::{Body, BoxFuture, Invoker, RawInvoker, ResponseBody};
pub use options::{InvokeOptions, DISPATCH_PROC, PROC_HEADER};
