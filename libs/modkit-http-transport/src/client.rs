use crate::builder::{ClientOption, HttpClientBuilder};
use crate::config::{DEFAULT_TIMEOUT, SysInfo};
use crate::error::HttpError;
use crate::response::ResponseBody;
use crate::transport::BoxTransport;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::fmt;
use std::time::Duration;
use tower::ServiceExt;

/// HTTP client executing requests through the transport pipeline
///
/// Every request passes the configured extensions (User-Agent, transaction id,
/// custom extensions), the optional access logging, and finally the
/// request-execution primitive bounded by the client timeout.
///
/// # Thread Safety
///
/// `HttpClient` is `Clone + Send + Sync`. Cloning is cheap; all clones share
/// the pipeline configured at build time.
///
/// # Example
///
/// ```ignore
/// let client = HttpClient::new([
///     ClientOption::timeout(Duration::from_secs(2)),
///     ClientOption::logging(TracingSink::new("my-service")),
///     ClientOption::sys_info("PAC", "my-service"),
/// ])?;
///
/// let mut req = Request::get("https://example.com/api").body(Full::new(Bytes::new()))?;
/// with_transaction_id(&mut req, "tid_1234");
/// let resp = client.execute(req).await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: BoxTransport,
    pub(crate) timeout: Duration,
}

impl HttpClient {
    /// Create a client over the default transport with the provided options
    ///
    /// # Errors
    /// See [`HttpClientBuilder::build`]
    pub fn new(options: impl IntoIterator<Item = ClientOption>) -> Result<Self, HttpError> {
        HttpClientBuilder::new().options(options).build()
    }

    /// Create a client with defaults:
    /// - 8 seconds timeout
    /// - standard User-Agent from `APP_PLATFORM` (default `PAC`) and
    ///   `APP_SYSTEM_CODE` (default `Unknown`)
    ///
    /// # Errors
    /// See [`HttpClientBuilder::build`]
    pub fn from_env() -> Result<Self, HttpError> {
        let sys_info = SysInfo::from_env();
        Self::new([
            ClientOption::timeout(DEFAULT_TIMEOUT),
            ClientOption::sys_info(sys_info.platform, sys_info.system_code),
        ])
    }

    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Request deadline applied to every request
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a request through the pipeline.
    ///
    /// Returns `Ok` for every HTTP status; `Err` only for malformed requests
    /// and transport failures (including timeouts).
    ///
    /// # Errors
    /// - `HttpError::MalformedRequest` if the URI is not absolute
    /// - `HttpError::Timeout` if the deadline elapsed
    /// - `HttpError::Transport` for network failures
    pub async fn execute(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<Response<ResponseBody>, HttpError> {
        self.service.clone().oneshot(request).await
    }

    /// Execute a GET request with an empty body
    ///
    /// # Errors
    /// `HttpError::RequestBuild` if `url` is not a valid URI, otherwise as [`Self::execute`]
    pub async fn get(&self, url: &str) -> Result<Response<ResponseBody>, HttpError> {
        let request = Request::get(url).body(Full::new(Bytes::new()))?;
        self.execute(request).await
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::build_info::BUILD_VERSION;
    use crate::layers::RequestLogRecord;
    use crate::tid::with_transaction_id;
    use httpmock::prelude::*;
    use std::sync::{Arc, Mutex};
    use tracing::Level;

    fn capture() -> (
        Arc<Mutex<Vec<RequestLogRecord>>>,
        impl Fn(Level, &RequestLogRecord) + Send + Sync + 'static,
    ) {
        let records: Arc<Mutex<Vec<RequestLogRecord>>> = Arc::default();
        let captured = Arc::clone(&records);
        let sink = move |_: Level, record: &RequestLogRecord| {
            captured.lock().unwrap().push(record.clone());
        };
        (records, sink)
    }

    #[tokio::test]
    async fn test_sys_info_user_agent_sent() {
        let server = MockServer::start();
        let expected_ua = format!("PAC-example-code/{}", BUILD_VERSION.replace(' ', "-"));
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/test")
                .header("user-agent", expected_ua.as_str());
            then.status(200);
        });

        let client = HttpClient::new([ClientOption::sys_info("PAC", "Example-Code")]).unwrap();
        let resp = client.get(&server.url("/test")).await.unwrap();

        assert_eq!(resp.status(), http::StatusCode::OK);
        mock.assert();
    }

    #[tokio::test]
    async fn test_transaction_id_and_user_agent_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/")
                .header("user-agent", "userAgent")
                .header("x-request-id", "tid_1234");
            then.status(404);
        });

        // userAgent is registered first, so the standard User-Agent is skipped
        let client = HttpClient::new([
            ClientOption::user_agent("userAgent"),
            ClientOption::sys_info("PLATFORM", "system-code"),
        ])
        .unwrap();

        let mut req = Request::get(server.url("/"))
            .body(Full::new(Bytes::new()))
            .unwrap();
        with_transaction_id(&mut req, "tid_1234");
        let resp = client.execute(req).await.unwrap();

        // Non-2xx statuses are returned, not converted to errors
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        mock.assert();
    }

    #[tokio::test]
    async fn test_logging_records_request() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/testing");
            then.status(200);
        });

        let (records, sink) = capture();
        let client = HttpClient::new([ClientOption::logging(sink)]).unwrap();
        client.get(&server.url("/testing")).await.unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "GET");
        assert_eq!(records[0].uri, "/testing");
        assert_eq!(records[0].protocol, "HTTP/1.1");
        assert_eq!(records[0].status.as_deref(), Some("200 OK"));
    }

    #[tokio::test]
    async fn test_timeout_is_logged_and_returned() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500));
        });

        let (records, sink) = capture();
        let client = HttpClient::new([
            ClientOption::timeout(Duration::from_millis(50)),
            ClientOption::logging(sink),
        ])
        .unwrap();

        let err = client.get(&server.url("/slow")).await.unwrap_err();
        assert!(matches!(err, HttpError::Timeout(d) if d == Duration::from_millis(50)));

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uri, "/slow");
        assert!(records[0].status.is_none());
    }

    #[tokio::test]
    async fn test_relative_url_is_malformed() {
        let (records, sink) = capture();
        let client = HttpClient::new([ClientOption::logging(sink)]).unwrap();

        let err = client.get("/relative").await.unwrap_err();

        assert!(matches!(err, HttpError::MalformedRequest { .. }));
        assert!(records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_env_builds() {
        let client = HttpClient::from_env().unwrap();
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_client_is_clone_and_shared() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/shared");
            then.status(200);
        });

        let client = HttpClient::new([ClientOption::user_agent("shared/1.0")]).unwrap();
        let url = server.url("/shared");

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let client = client.clone();
                let url = url.clone();
                tokio::spawn(async move { client.get(&url).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().status(), http::StatusCode::OK);
        }

        assert_eq!(mock.calls(), 10);
    }

    #[test]
    fn test_http_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpClient>();
    }
}
