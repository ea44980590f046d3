//! reqwest-backed [`Transport`].

use std::time::Duration;

use hermes_config::HttpConfig;
use hermes_core::{
    BoxFuture, Credentials, FetchRequest, FetchResponse, HermesError, HermesResult, Transport,
};

/// Sends requests over HTTP with reqwest.
///
/// Two clients are kept: one with a cookie jar for `include` and
/// `same-origin` requests and one without cookies for `omit`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    with_cookies: reqwest::Client,
    without_cookies: reqwest::Client,
}

impl HttpTransport {
    /// Builds both clients from the HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HermesError::Config`] if reqwest rejects the settings.
    pub fn new(config: &HttpConfig) -> HermesResult<Self> {
        Ok(Self {
            with_cookies: build_client(config, true)?,
            without_cookies: build_client(config, false)?,
        })
    }

    fn client_for(&self, credentials: Option<Credentials>) -> &reqwest::Client {
        match credentials {
            Some(mode) if !mode.sends_cookies() => &self.without_cookies,
            _ => &self.with_cookies,
        }
    }
}

fn build_client(config: &HttpConfig, cookies: bool) -> HermesResult<reqwest::Client> {
    reqwest::Client::builder()
        .cookie_store(cookies)
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| HermesError::config(format!("failed to build HTTP client: {e}")))
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, request: FetchRequest) -> BoxFuture<'a, HermesResult<FetchResponse>> {
        Box::pin(async move {
            let FetchRequest {
                method,
                url,
                headers,
                credentials,
                body,
            } = request;

            let mut builder = self
                .client_for(credentials)
                .request(method, url.as_str())
                .headers(headers);
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| HermesError::transport_for(e.to_string(), url.as_str()))?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| HermesError::transport_for(e.to_string(), url.as_str()))?;

            tracing::trace!(url = %url, status = status.as_u16(), bytes = body.len(), "http exchange");

            let mut fetched = FetchResponse::new(status, body);
            fetched.headers = headers;
            Ok(fetched)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            let reply = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&received).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_builds_from_config() {
        assert!(HttpTransport::new(&HttpConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (base, server) = serve_once("200 OK", r#"{"id":1}"#).await;
        let transport = HttpTransport::new(&HttpConfig::default()).unwrap();

        let mut request = FetchRequest::get(format!("{base}/apps/1"));
        request.set_header(http::header::AUTHORIZATION, "Bearer abc");
        let response = transport.send(request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.decode().unwrap()["id"], 1);

        let raw = server.await.unwrap().to_lowercase();
        assert!(raw.starts_with("get /apps/1 "));
        assert!(raw.contains("authorization: bearer abc"));
        assert!(raw.contains("user-agent: hermes/"));
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_transport_error() {
        let (base, _server) = serve_once("404 Not Found", r#"{"message":"gone"}"#).await;
        let transport = HttpTransport::new(&HttpConfig::default()).unwrap();

        let response = transport.send(FetchRequest::get(format!("{base}/apps/9"))).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_connection_failure_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&HttpConfig::default()).unwrap();
        let err = transport
            .send(FetchRequest::get(format!("http://{addr}/apps")))
            .await
            .unwrap_err();
        assert!(matches!(err, HermesError::Transport { .. }));
    }
}
