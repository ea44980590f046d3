//! Outgoing request and incoming response descriptors.
//!
//! The pipeline never talks to the network directly. Stages shape a
//! [`FetchRequest`], the terminal fetch stage hands it to a [`Transport`],
//! and the resulting [`FetchResponse`] is decoded into a [`FetchJson`].

use crate::error::HermesResult;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// A boxed future, used wherever a trait needs to return async work.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The decoded outcome of a call.
///
/// `Ok` holds the response body for a 2xx answer, `Err` holds the domain
/// failure for anything else. Callers branch on it explicitly.
pub type FetchJson = Result<serde_json::Value, ApiFailure>;

/// Cookie credential policy for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    /// Always send cookies.
    Include,
    /// Send cookies only to the same origin.
    SameOrigin,
    /// Never send cookies.
    Omit,
}

impl Credentials {
    /// Returns the wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::SameOrigin => "same-origin",
            Self::Omit => "omit",
        }
    }

    /// Returns true if cookies should be attached.
    #[must_use]
    pub const fn sends_cookies(self) -> bool {
        !matches!(self, Self::Omit)
    }
}

/// The outgoing request descriptor.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// HTTP method.
    pub method: Method,
    /// Target URL. Relative until the request-shaping stage resolves it.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Cookie credential policy, `None` until a stage decides.
    pub credentials: Option<Credentials>,
    /// Request body.
    pub body: Option<Bytes>,
}

impl FetchRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            credentials: None,
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Sets a header, replacing any previous value.
    ///
    /// Values that are not valid header text are ignored.
    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }

    /// Returns a header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a JSON body.
    pub fn set_json_body(&mut self, body: &serde_json::Value) {
        self.body = Some(Bytes::from(body.to_string()));
    }

    /// Returns true if the URL already carries a scheme.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.url.starts_with("http")
    }

    /// Serializes the request for diagnostics.
    ///
    /// The `authorization` header is redacted.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        let headers: serde_json::Map<String, serde_json::Value> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let value = if name == http::header::AUTHORIZATION {
                    "[redacted]".to_string()
                } else {
                    value.to_str().unwrap_or("<binary>").to_string()
                };
                (name.as_str().to_string(), serde_json::Value::String(value))
            })
            .collect();

        serde_json::json!({
            "method": self.method.as_str(),
            "url": self.url,
            "headers": headers,
            "credentials": self.credentials.map(Credentials::as_str),
        })
    }
}

/// The raw response returned by a [`Transport`].
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl FetchResponse {
    /// Creates a response with no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a response carrying a JSON body.
    #[must_use]
    pub fn json(status: StatusCode, body: &serde_json::Value) -> Self {
        let mut response = Self::new(status, body.to_string());
        response.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }

    /// Decodes the body as JSON. An empty body decodes to `null`.
    pub fn decode(&self) -> HermesResult<serde_json::Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// A domain failure returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiFailure {
    /// HTTP status, if the failure came from a response.
    pub status: Option<u16>,
    /// Human-readable message.
    pub message: String,
    /// Backend error code, if one was provided.
    pub code: Option<String>,
    /// The decoded response body.
    #[serde(default)]
    pub body: serde_json::Value,
}

impl ApiFailure {
    /// Creates a failure with just a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            code: None,
            body: serde_json::Value::Null,
        }
    }

    /// Builds a failure from a non-2xx response and its decoded body.
    ///
    /// The message comes from the body's `message` or `error` field when
    /// present, otherwise from the status reason phrase.
    #[must_use]
    pub fn from_response(status: StatusCode, body: serde_json::Value) -> Self {
        let message = ["message", "error"]
            .iter()
            .find_map(|field| body.get(field).and_then(serde_json::Value::as_str))
            .map(ToString::to_string)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        let code = body
            .get("code")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);

        Self {
            status: Some(status.as_u16()),
            message,
            code,
            body,
        }
    }
}

/// The seam between the pipeline and the network.
///
/// `HttpTransport` in `hermes-client` is the production implementation;
/// `hermes-test` provides a scripted one.
pub trait Transport: Send + Sync + 'static {
    /// Sends the request and returns the raw response.
    ///
    /// Only failures to complete the exchange are errors; a 4xx or 5xx
    /// answer is a successful exchange.
    fn send<'a>(&'a self, request: FetchRequest) -> BoxFuture<'a, HermesResult<FetchResponse>>;
}
