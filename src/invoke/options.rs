//! Per-call options for the invocation facade.

use std::collections::HashMap;

/// Reserved request header naming the target backend function.
///
/// The facade sets this on every call, silently overwriting any value the
/// caller put there - the same convention as the transport it sits on, so
/// no error is raised on conflict.
pub const PROC_HEADER: &str = "proc";

/// The single transport procedure every facade call goes through. The
/// actual backend function name travels in [`PROC_HEADER`].
pub const DISPATCH_PROC: &str = "chanwire:invoke";

/// Options applied to a single invocation.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Request headers sent alongside the body.
    pub headers: HashMap<String, String>,
}

impl InvokeOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header (builder style). Later values for the same name win.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
