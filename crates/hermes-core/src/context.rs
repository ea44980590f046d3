//! Request context types.
//!
//! The [`ApiCtx`] carries all per-call state through the middleware chain:
//! the outgoing request, the endpoint that was invoked, the caller's payload
//! and, once the chain has run, the response and its decoded result.

use crate::request::{FetchJson, FetchRequest, FetchResponse};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// A unique identifier for each call, using UUID v7.
///
/// # Example
///
/// ```
/// use hermes_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-call context threaded through the middleware chain.
///
/// Stages read and write it as the call moves inward and outward. After
/// the chain completes, [`ApiCtx::json`] holds the outcome: `None` if the
/// call was aborted or failed before producing one, `Some(Ok(_))` on
/// success, `Some(Err(_))` for a domain failure.
///
/// # Example
///
/// ```
/// use hermes_core::{ApiCtx, FetchRequest};
/// use serde_json::json;
///
/// let ctx = ApiCtx::new("fetch-app", json!({ "id": "42" }))
///     .with_request(FetchRequest::get("/apps/:id"));
///
/// assert_eq!(ctx.name(), "fetch-app");
/// assert_eq!(ctx.key(), r#"fetch-app|{"id":"42"}"#);
/// assert!(ctx.json().is_none());
/// ```
#[derive(Debug)]
pub struct ApiCtx {
    request_id: RequestId,
    name: String,
    key: String,
    payload: serde_json::Value,
    request: FetchRequest,
    response: Option<FetchResponse>,
    json: Option<FetchJson>,
    no_token: bool,
    elevated: bool,
    aborted: bool,
    generation: u64,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ApiCtx {
    /// Creates a context for the named endpoint.
    ///
    /// The key identifies the request: the name plus the payload JSON.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        let name = name.into();
        let key = request_key(&name, &payload);
        Self {
            request_id: RequestId::new(),
            request: FetchRequest::get(""),
            name,
            key,
            payload,
            response: None,
            json: None,
            no_token: false,
            elevated: false,
            aborted: false,
            generation: 0,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the context with the given outgoing request.
    #[must_use]
    pub fn with_request(mut self, request: FetchRequest) -> Self {
        self.request = request;
        self
    }

    /// Returns the context tagged with a store generation.
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Returns the call id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the request identity used for loaders.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the caller's payload.
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Returns a payload field as text. Numbers are rendered.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        match self.payload.get(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Returns the outgoing request.
    #[must_use]
    pub const fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// Returns the outgoing request for modification.
    pub fn request_mut(&mut self) -> &mut FetchRequest {
        &mut self.request
    }

    /// Returns the raw response, once one arrived.
    #[must_use]
    pub const fn response(&self) -> Option<&FetchResponse> {
        self.response.as_ref()
    }

    /// Records the raw response.
    pub fn set_response(&mut self, response: FetchResponse) {
        self.response = Some(response);
    }

    /// Returns the decoded outcome.
    #[must_use]
    pub const fn json(&self) -> Option<&FetchJson> {
        self.json.as_ref()
    }

    /// Sets the decoded outcome.
    pub fn set_json(&mut self, json: FetchJson) {
        self.json = Some(json);
    }

    /// Clears the decoded outcome.
    pub fn clear_json(&mut self) {
        self.json = None;
    }

    /// Takes the decoded outcome out of the context.
    pub fn take_json(&mut self) -> Option<FetchJson> {
        self.json.take()
    }

    /// Returns true if the call succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.json, Some(Ok(_)))
    }

    /// Returns true if the bearer token must not be attached.
    #[must_use]
    pub const fn no_token(&self) -> bool {
        self.no_token
    }

    /// Controls bearer token attachment.
    pub fn set_no_token(&mut self, no_token: bool) {
        self.no_token = no_token;
    }

    /// Returns true if the call needs the elevated token.
    #[must_use]
    pub const fn elevated(&self) -> bool {
        self.elevated
    }

    /// Requests the elevated token for this call.
    pub fn set_elevated(&mut self, elevated: bool) {
        self.elevated = elevated;
    }

    /// Returns true if the abort signal won the race.
    #[must_use]
    pub const fn aborted(&self) -> bool {
        self.aborted
    }

    /// Marks the call as aborted.
    pub fn mark_aborted(&mut self) {
        self.aborted = true;
    }

    /// Returns the store generation the call started in.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the elapsed time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Serializes the context for error reports.
    ///
    /// Credentials never leave through a snapshot: values under
    /// [`REDACTED_KEYS`] are masked in the payload, the key and the decoded
    /// response, and the request's `authorization` header is masked too.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        let json = match &self.json {
            None => serde_json::Value::Null,
            Some(Ok(value)) => serde_json::json!({ "ok": true, "value": redact(value) }),
            Some(Err(failure)) => serde_json::json!({ "ok": false, "error": failure }),
        };
        let payload = redact(&self.payload);

        serde_json::json!({
            "request_id": self.request_id,
            "name": self.name,
            "key": request_key(&self.name, &payload),
            "payload": payload,
            "request": self.request.snapshot(),
            "status": self.response.as_ref().map(|r| r.status.as_u16()),
            "json": json,
            "no_token": self.no_token,
            "elevated": self.elevated,
            "aborted": self.aborted,
            "elapsed_ms": u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}

/// Substrings of object keys whose values are masked in snapshots.
pub const REDACTED_KEYS: &[&str] = &["password", "passphrase", "secret", "token"];

const REDACTED: &str = "[redacted]";

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    REDACTED_KEYS.iter().any(|pattern| key.contains(pattern))
}

/// Returns `value` with every sensitive field masked, at any depth.
#[must_use]
pub fn redact(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if is_sensitive(key) && !value.is_null() {
                        serde_json::Value::from(REDACTED)
                    } else {
                        redact(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact).collect())
        }
        other => other.clone(),
    }
}

fn request_key(name: &str, payload: &serde_json::Value) -> String {
    if payload.is_null() {
        name.to_string()
    } else {
        format!("{name}|{payload}")
    }
}
