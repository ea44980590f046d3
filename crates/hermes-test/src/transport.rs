//! Scripted transport.

use bytes::Bytes;
use hermes_core::{BoxFuture, FetchRequest, FetchResponse, HermesError, HermesResult, Transport};
use http::{Method, StatusCode};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: StatusCode, body: Bytes },
    Fail(String),
    Hang,
}

/// One scripted answer, matched on method, path and optionally query.
///
/// # Example
///
/// ```
/// use hermes_test::MockRoute;
/// use http::StatusCode;
/// use std::time::Duration;
///
/// let route = MockRoute::get("/apps")
///     .query("page", "2")
///     .latency(Duration::from_millis(50))
///     .json(StatusCode::OK, serde_json::json!({ "current_page": 2 }));
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct MockRoute {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    latency: Option<Duration>,
    reply: Reply,
}

impl MockRoute {
    /// Starts a route for `method` and `path`, answering `200 null`.
    pub fn new(method: &str, path: impl Into<String>) -> Self {
        Self {
            method: Method::from_bytes(method.as_bytes()).expect("valid HTTP method"),
            path: path.into(),
            query: Vec::new(),
            latency: None,
            reply: Reply::Respond {
                status: StatusCode::OK,
                body: Bytes::new(),
            },
        }
    }

    /// Starts a GET route.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Requires a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Delays the answer.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answers with a JSON body.
    pub fn json(mut self, status: StatusCode, body: serde_json::Value) -> Self {
        self.reply = Reply::Respond {
            status,
            body: Bytes::from(body.to_string()),
        };
        self
    }

    /// Answers with a raw body.
    pub fn text(mut self, status: StatusCode, body: impl Into<String>) -> Self {
        self.reply = Reply::Respond {
            status,
            body: Bytes::from(body.into()),
        };
        self
    }

    /// Fails the exchange with a transport error.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.reply = Reply::Fail(message.into());
        self
    }

    /// Never answers.
    pub fn hang(mut self) -> Self {
        self.reply = Reply::Hang;
        self
    }

    fn matches(&self, method: &Method, path: &str, query: &[(String, String)]) -> bool {
        self.method == *method
            && self.path == path
            && self.query.iter().all(|pair| query.contains(pair))
    }
}

/// Splits a URL into path and query pairs, ignoring scheme and host.
fn split_url(url: &str) -> (String, Vec<(String, String)>) {
    let after_scheme = url.find("://").map_or(url, |i| &url[i + 3..]);
    let path_and_query = if url.contains("://") {
        after_scheme.find('/').map_or("/", |i| &after_scheme[i..])
    } else {
        after_scheme
    };

    let (path, query) = path_and_query
        .split_once('?')
        .unwrap_or((path_and_query, ""));
    let pairs = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name.to_string(), value.to_string())
        })
        .collect();
    (path.to_string(), pairs)
}

#[derive(Debug, Default)]
struct MockState {
    routes: Vec<MockRoute>,
    requests: Vec<FetchRequest>,
}

/// A [`Transport`] answering from scripted [`MockRoute`]s.
///
/// Routes requiring query parameters take precedence over routes that do
/// not; among equals the latest registration wins. Unmatched requests get a
/// `404` with a JSON message. Clones share routes and recorded requests.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Creates a transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.
    pub fn mock(&self, route: MockRoute) -> &Self {
        self.state.lock().routes.push(route);
        self
    }

    /// Answers `method path` with a JSON body.
    pub fn on_json(
        &self,
        method: &str,
        path: &str,
        status: StatusCode,
        body: serde_json::Value,
    ) -> &Self {
        self.mock(MockRoute::new(method, path).json(status, body))
    }

    /// Answers `method path` with a raw body.
    pub fn on_text(&self, method: &str, path: &str, status: StatusCode, body: &str) -> &Self {
        self.mock(MockRoute::new(method, path).text(status, body))
    }

    /// Fails `method path` with a transport error.
    pub fn fail(&self, method: &str, path: &str, message: &str) -> &Self {
        self.mock(MockRoute::new(method, path).fail(message))
    }

    /// Never answers `method path`.
    pub fn hang(&self, method: &str, path: &str) -> &Self {
        self.mock(MockRoute::new(method, path).hang())
    }

    /// Returns every request sent, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.state.lock().requests.clone()
    }

    /// Returns the number of requests sent.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Returns the highest number of requests that were awaiting an answer
    /// at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lookup(&self, request: &FetchRequest) -> (Reply, Option<Duration>) {
        let (path, query) = split_url(&request.url);
        let mut state = self.state.lock();
        state.requests.push(request.clone());

        let best = state
            .routes
            .iter()
            .rev()
            .filter(|route| route.matches(&request.method, &path, &query))
            .fold(None::<&MockRoute>, |best, route| match best {
                Some(best) if best.query.len() >= route.query.len() => Some(best),
                _ => Some(route),
            });

        match best {
            Some(route) => (route.reply.clone(), route.latency),
            None => (
                Reply::Respond {
                    status: StatusCode::NOT_FOUND,
                    body: Bytes::from(
                        serde_json::json!({
                            "message": format!("no mock for {} {path}", request.method)
                        })
                        .to_string(),
                    ),
                },
                None,
            ),
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Transport for MockTransport {
    fn send<'a>(&'a self, request: FetchRequest) -> BoxFuture<'a, HermesResult<FetchResponse>> {
        Box::pin(async move {
            let (reply, latency) = self.lookup(&request);

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            match reply {
                Reply::Respond { status, body } => Ok(FetchResponse::new(status, body)),
                Reply::Fail(message) => Err(HermesError::transport_for(message, request.url)),
                Reply::Hang => std::future::pending().await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_url() {
        assert_eq!(
            split_url("https://api.test/apps?page=2&per_page=20"),
            (
                "/apps".to_string(),
                vec![
                    ("page".to_string(), "2".to_string()),
                    ("per_page".to_string(), "20".to_string())
                ]
            )
        );
        assert_eq!(split_url("https://api.test").0, "/");
        assert_eq!(split_url("/apps").0, "/apps");
    }

    #[tokio::test]
    async fn test_query_route_preferred() {
        let transport = MockTransport::new();
        transport
            .mock(MockRoute::get("/apps").query("page", "2").json(StatusCode::OK, json!(2)))
            .on_json("GET", "/apps", StatusCode::OK, json!(1));

        let page = |url: &'static str| {
            let transport = transport.clone();
            async move {
                let response = transport.send(FetchRequest::get(url)).await.unwrap();
                response.decode().unwrap()
            }
        };

        assert_eq!(page("https://api.test/apps?page=2").await, json!(2));
        assert_eq!(page("https://api.test/apps").await, json!(1));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let transport = MockTransport::new();
        let response = transport
            .send(FetchRequest::get("https://api.test/nope"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.decode().unwrap()["message"], "no mock for GET /nope");
    }

    #[tokio::test]
    async fn test_failure() {
        let transport = MockTransport::new();
        transport.fail("POST", "/tokens", "Failed to fetch");
        let mut request = FetchRequest::get("https://auth.test/tokens");
        request.method = Method::POST;

        let err = transport.send(request).await.unwrap_err();
        assert!(err.is_benign());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_tracking() {
        let transport = MockTransport::new();
        transport.mock(
            MockRoute::get("/slow")
                .latency(Duration::from_millis(100))
                .json(StatusCode::OK, json!(null)),
        );

        let a = transport.send(FetchRequest::get("https://api.test/slow"));
        let b = transport.send(FetchRequest::get("https://api.test/slow"));
        let (a, b) = tokio::join!(a, b);
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(transport.max_in_flight(), 2);
    }
}
