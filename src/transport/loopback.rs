//! In-process transport - a backend function table behind [`RawInvoker`].
//!
//! `LoopbackInvoker` wires a frontend and a backend together inside one
//! process: calls made through the invocation facade are routed to
//! registered backend functions by the reserved function-name header, and
//! backend functions can push ordered streams back through the shared
//! callback registry.
//!
//! This is the transport the test suite drives end to end; out-of-process
//! transports implement the same [`RawInvoker`] seam.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chanwire::{CallbackRegistry, InvokeOptions, Invoker, LoopbackInvoker, ResponseBody};
//!
//! let registry = Arc::new(CallbackRegistry::new());
//! let transport = LoopbackInvoker::new(Arc::clone(&registry));
//! transport.register("echo", |request, _ctx| async move {
//!     Ok(ResponseBody::Raw(request.body))
//! });
//!
//! let invoker = Invoker::new(transport);
//! let reply: String = invoker.invoke("echo", "hello", InvokeOptions::new()).await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::channel::ChannelSender;
use crate::codec::JsonCodec;
use crate::error::{Result, WireError};
use crate::invoke::{
    BoxFuture, InvokeOptions, RawInvoker, ResponseBody, DISPATCH_PROC, PROC_HEADER,
};
use crate::registry::{CallbackRegistry, ChannelId};

/// One inbound request as seen by a backend function.
#[derive(Debug, Clone)]
pub struct Request {
    /// Opaque request body.
    pub body: Bytes,
    /// Request headers, reserved ones included.
    pub headers: HashMap<String, String>,
}

/// Capabilities handed to a backend function alongside the request.
#[derive(Clone)]
pub struct BackendContext {
    registry: Arc<CallbackRegistry>,
}

impl BackendContext {
    /// Open the sending end of a channel the caller referenced in its
    /// request body.
    pub fn channel(&self, id: ChannelId) -> ChannelSender {
        ChannelSender::new(Arc::clone(&self.registry), id)
    }
}

type BackendFn =
    dyn Fn(Request, BackendContext) -> BoxFuture<'static, Result<ResponseBody>> + Send + Sync;

/// In-process [`RawInvoker`] dispatching to named backend functions.
pub struct LoopbackInvoker {
    registry: Arc<CallbackRegistry>,
    funcs: Mutex<HashMap<String, Arc<BackendFn>>>,
}

impl LoopbackInvoker {
    /// Create a loopback transport pushing channel messages through
    /// `registry`.
    pub fn new(registry: Arc<CallbackRegistry>) -> Self {
        Self {
            registry,
            funcs: Mutex::new(HashMap::new()),
        }
    }

    /// The registry this transport delivers channel messages through.
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Arc<BackendFn>>> {
        self.funcs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a backend function under `name`. A later registration for
    /// the same name replaces the earlier one.
    pub fn register<F, Fut>(&self, name: &str, func: F)
    where
        F: Fn(Request, BackendContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponseBody>> + Send + 'static,
    {
        let wrapped: Arc<BackendFn> = Arc::new(
            move |request, ctx| -> BoxFuture<'static, Result<ResponseBody>> {
                Box::pin(func(request, ctx))
            },
        );
        self.table().insert(name.to_string(), wrapped);
    }

    /// Register a backend function whose body is JSON-decoded into `T`
    /// before the function runs. A body that does not decode fails the
    /// call with the decode error.
    pub fn register_json<T, F, Fut>(&self, name: &str, func: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T, BackendContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponseBody>> + Send + 'static,
    {
        self.register(name, move |request: Request, ctx: BackendContext| {
            let outcome = JsonCodec::decode::<T>(&request.body).map(|value| func(value, ctx));
            async move {
                match outcome {
                    Ok(fut) => fut.await,
                    Err(err) => Err(err),
                }
            }
        });
    }
}

impl RawInvoker for LoopbackInvoker {
    fn call<'a>(
        &'a self,
        proc: &'a str,
        body: Bytes,
        options: InvokeOptions,
    ) -> BoxFuture<'a, Result<ResponseBody>> {
        Box::pin(async move {
            if proc != DISPATCH_PROC {
                return Err(WireError::Transport(format!(
                    "unknown transport procedure: {proc}"
                )));
            }
            let func_name = options
                .headers
                .get(PROC_HEADER)
                .cloned()
                .ok_or_else(|| WireError::Transport(format!("missing {PROC_HEADER} header")))?;

            let func = self
                .table()
                .get(&func_name)
                .cloned()
                .ok_or_else(|| WireError::FuncNotFound(func_name.clone()))?;

            tracing::debug!("dispatching to backend function {}", func_name);
            let ctx = BackendContext {
                registry: Arc::clone(&self.registry),
            };
            func(
                Request {
                    body,
                    headers: options.headers,
                },
                ctx,
            )
            .await
        })
    }
}
