//! Invocation facade over a raw request/response transport.
//!
//! [`RawInvoker`] is the boundary to the outside world: it carries opaque
//! bytes to a named transport procedure and settles with a response
//! payload or the transport's failure. [`Invoker`] composes it with the
//! JSON codec into a typed call: encode the argument, route through the
//! reserved function-name header, decode the result.
//!
//! Failures are propagated unchanged; this layer performs no retries and
//! adds no wrapping beyond the debug-build response-shape check.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::codec::{JsonCodec, RawCodec};
use crate::error::Result;
use crate::invoke::options::{InvokeOptions, DISPATCH_PROC, PROC_HEADER};

/// Boxed future, the return shape of [`RawInvoker`] implementations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Response payload produced by a transport.
///
/// A correct backend always answers [`ResponseBody::Raw`]; the JSON
/// variant exists because transports that deal in structured values can
/// produce it, and the facade must be able to tell the two apart.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Opaque bytes.
    Raw(Bytes),
    /// JSON text.
    Json(String),
}

impl ResponseBody {
    /// Encode a value as raw JSON bytes, the canonical response shape for
    /// backend functions.
    pub fn raw_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(ResponseBody::Raw(Bytes::from(JsonCodec::encode(value)?)))
    }
}

/// The underlying request/response primitive.
///
/// Implementations carry `body` to the transport procedure named `proc`
/// and resolve with the response, or reject with the transport's failure
/// unchanged.
pub trait RawInvoker: Send + Sync {
    /// Perform one call.
    fn call<'a>(
        &'a self,
        proc: &'a str,
        body: Bytes,
        options: InvokeOptions,
    ) -> BoxFuture<'a, Result<ResponseBody>>;
}

/// Request payload, chosen explicitly at the call site: either opaque
/// bytes passed through unchanged, or a structured value to be
/// JSON-encoded.
#[derive(Debug, Clone)]
pub enum Body {
    /// Pre-encoded bytes, sent as-is.
    Raw(Bytes),
    /// Structured value, JSON-encoded before dispatch.
    Json(Value),
}

impl Body {
    fn into_bytes(self) -> Result<Bytes> {
        match self {
            Body::Raw(bytes) => Ok(RawCodec::serialize_bytes(bytes)),
            Body::Json(value) => Ok(Bytes::from(JsonCodec::encode(&value)?)),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Raw(bytes)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

/// Typed invocation facade wrapping a [`RawInvoker`].
pub struct Invoker<R> {
    raw: R,
}

impl<R: RawInvoker> Invoker<R> {
    /// Wrap a raw invoker.
    pub fn new(raw: R) -> Self {
        Self { raw }
    }

    /// Access the wrapped raw invoker.
    pub fn raw_invoker(&self) -> &R {
        &self.raw
    }

    /// Invoke `func` with a pre-encoded byte body; the response bytes come
    /// back untouched. Callers that need to bypass JSON entirely use this.
    pub async fn invoke_raw(
        &self,
        func: &str,
        body: Bytes,
        options: InvokeOptions,
    ) -> Result<Bytes> {
        self.invoke_body(func, Body::Raw(body), options).await
    }

    /// Invoke `func` with an explicit [`Body`].
    pub async fn invoke_body(
        &self,
        func: &str,
        body: Body,
        options: InvokeOptions,
    ) -> Result<Bytes> {
        let mut options = options;
        options
            .headers
            .insert(PROC_HEADER.to_string(), func.to_string());

        let body = body.into_bytes()?;
        let response = self.raw.call(DISPATCH_PROC, body, options).await?;

        match response {
            ResponseBody::Raw(bytes) => Ok(bytes),
            ResponseBody::Json(text) => coerce_json_response(text),
        }
    }

    /// Invoke `func` with a JSON-encoded argument and JSON-decode the
    /// response into `U`.
    pub async fn invoke<T, U>(&self, func: &str, body: &T, options: InvokeOptions) -> Result<U>
    where
        T: Serialize + ?Sized,
        U: DeserializeOwned,
    {
        let encoded = JsonCodec::encode(body)?;
        let response = self.invoke_raw(func, Bytes::from(encoded), options).await?;
        JsonCodec::decode(&response)
    }
}

/// Debug builds verify the transport honored the raw-response contract;
/// release builds skip the check and pass the text through as bytes.
#[cfg(debug_assertions)]
fn coerce_json_response(_text: String) -> Result<Bytes> {
    Err(crate::error::WireError::ContractViolation(
        "transport answered with JSON where raw bytes were required; \
         this is a bug in the invocation layer, not in the caller"
            .to_string(),
    ))
}

#[cfg(not(debug_assertions))]
fn coerce_json_response(text: String) -> Result<Bytes> {
    Ok(Bytes::from(text.into_bytes()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::error::WireError;

    /// Records every call and answers with a preconfigured response.
    struct RecordingInvoker {
        calls: Arc<Mutex<Vec<(String, Vec<u8>, HashMap<String, String>)>>>,
        response: ResponseBody,
    }

    impl RecordingInvoker {
        fn new(response: ResponseBody) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                response,
            }
        }
    }

    impl RawInvoker for RecordingInvoker {
        fn call<'a>(
            &'a self,
            proc: &'a str,
            body: Bytes,
            options: InvokeOptions,
        ) -> BoxFuture<'a, Result<ResponseBody>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push((proc.to_string(), body.to_vec(), options.headers));
                Ok(self.response.clone())
            })
        }
    }

    /// Answers every request with its own body.
    struct EchoInvoker;

    impl RawInvoker for EchoInvoker {
        fn call<'a>(
            &'a self,
            _proc: &'a str,
            body: Bytes,
            _options: InvokeOptions,
        ) -> BoxFuture<'a, Result<ResponseBody>> {
            Box::pin(async move { Ok(ResponseBody::Raw(body)) })
        }
    }

    struct FailingInvoker;

    impl RawInvoker for FailingInvoker {
        fn call<'a>(
            &'a self,
            _proc: &'a str,
            _body: Bytes,
            _options: InvokeOptions,
        ) -> BoxFuture<'a, Result<ResponseBody>> {
            Box::pin(async { Err(WireError::Transport("backend unreachable".to_string())) })
        }
    }

    #[tokio::test]
    async fn test_request_encoding_and_function_header() {
        #[derive(Serialize)]
        struct Args {
            foo: String,
            bar: u32,
        }

        let raw = RecordingInvoker::new(ResponseBody::Raw(Bytes::from_static(b"null")));
        let invoker = Invoker::new(raw);

        let _: Value = invoker
            .invoke(
                "process_data",
                &Args {
                    foo: "foo".to_string(),
                    bar: 42,
                },
                InvokeOptions::new(),
            )
            .await
            .unwrap();

        let calls = invoker.raw_invoker().calls.lock().unwrap();
        let (proc, body, headers) = &calls[0];
        assert_eq!(proc, DISPATCH_PROC);
        assert_eq!(body.as_slice(), br#"{"foo":"foo","bar":42}"#);
        assert_eq!(headers.get(PROC_HEADER).unwrap(), "process_data");
    }

    #[tokio::test]
    async fn test_reserved_header_is_overwritten_silently() {
        let raw = RecordingInvoker::new(ResponseBody::Raw(Bytes::from_static(b"null")));
        let invoker = Invoker::new(raw);

        let options = InvokeOptions::new()
            .header(PROC_HEADER, "caller_lies")
            .header("trace-id", "kept");
        let _: Value = invoker.invoke("truth", &json!({}), options).await.unwrap();

        let calls = invoker.raw_invoker().calls.lock().unwrap();
        let headers = &calls[0].2;
        assert_eq!(headers.get(PROC_HEADER).unwrap(), "truth");
        assert_eq!(headers.get("trace-id").unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_typed_round_trip_through_echo() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Payload {
            name: String,
            values: Vec<i32>,
            nested: Option<Box<Payload>>,
        }

        let original = Payload {
            name: "outer".to_string(),
            values: vec![1, 2, 3],
            nested: Some(Box::new(Payload {
                name: "inner".to_string(),
                values: vec![],
                nested: None,
            })),
        };

        let invoker = Invoker::new(EchoInvoker);
        let back: Payload = invoker
            .invoke("echo", &original, InvokeOptions::new())
            .await
            .unwrap();

        assert_eq!(back, original);
    }

    #[tokio::test]
    async fn test_raw_bytes_bypass_json() {
        let invoker = Invoker::new(EchoInvoker);

        let body = Bytes::from_static(&[0x00, 0xFF, 0x7F, 0x80]);
        let response = invoker
            .invoke_raw("binary", body.clone(), InvokeOptions::new())
            .await
            .unwrap();

        assert_eq!(response, body);
    }

    #[tokio::test]
    async fn test_body_json_variant_encodes_value() {
        let raw = RecordingInvoker::new(ResponseBody::Raw(Bytes::new()));
        let invoker = Invoker::new(raw);

        invoker
            .invoke_body("fn", Body::from(json!({"k": 1})), InvokeOptions::new())
            .await
            .unwrap();

        let calls = invoker.raw_invoker().calls.lock().unwrap();
        assert_eq!(calls[0].1.as_slice(), br#"{"k":1}"#);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_unchanged() {
        let invoker = Invoker::new(FailingInvoker);

        let err = invoker
            .invoke_raw("anything", Bytes::new(), InvokeOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WireError::Transport(msg) if msg == "backend unreachable"));
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    async fn test_json_response_is_a_contract_violation() {
        let raw = RecordingInvoker::new(ResponseBody::Json("{}".to_string()));
        let invoker = Invoker::new(raw);

        let err = invoker
            .invoke_raw("fn", Bytes::new(), InvokeOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WireError::ContractViolation(_)));
    }

    #[cfg(not(debug_assertions))]
    #[tokio::test]
    async fn test_json_response_passes_through_in_release() {
        let raw = RecordingInvoker::new(ResponseBody::Json("{\"ok\":true}".to_string()));
        let invoker = Invoker::new(raw);

        let bytes = invoker
            .invoke_raw("fn", Bytes::new(), InvokeOptions::new())
            .await
            .unwrap();

        assert_eq!(&bytes[..], br#"{"ok":true}"#);
    }
}
