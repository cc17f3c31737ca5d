use crate::tid::transaction_id_from_request;
use http::{Request, Response, Uri, Version};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service};
use tracing::Level;

/// Target of the access records emitted by [`TracingSink`]
pub const ACCESS_LOG_TARGET: &str = "modkit_http_transport::access";

/// Replacement for the password component of a logged URL
const REDACTED_PASSWORD: &str = "xxxxx";

/// One access record per outgoing request.
///
/// `status` is only present when the wrapped transport returned a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestLogRecord {
    #[serde(rename = "responsetime")]
    pub response_time_ms: u64,
    pub username: String,
    pub method: String,
    pub transaction_id: String,
    pub uri: String,
    pub request_url: String,
    pub protocol: &'static str,
    pub referer: String,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RequestLogRecord {
    /// Capture the request fields. Timing and status are filled in by [`Self::finish`].
    fn capture<B>(req: &Request<B>) -> Self {
        let header = |name: http::header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned()
        };

        let uri = match req.uri().path() {
            "" => "/".to_owned(),
            path => path.to_owned(),
        };

        Self {
            response_time_ms: 0,
            username: username(req.uri()).to_owned(),
            method: req.method().as_str().to_owned(),
            transaction_id: transaction_id_from_request(req),
            uri,
            request_url: redacted_url(req.uri()),
            protocol: protocol(req.version()),
            referer: header(http::header::REFERER),
            user_agent: header(http::header::USER_AGENT),
            status: None,
        }
    }

    fn finish(mut self, elapsed: Duration, status: Option<String>) -> Self {
        self.response_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.status = status;
        self
    }
}

/// Destination of access records.
///
/// Any `Fn(Level, &RequestLogRecord)` closure is a sink.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, record: &RequestLogRecord);
}

impl<F> LogSink for F
where
    F: Fn(Level, &RequestLogRecord) + Send + Sync,
{
    fn log(&self, level: Level, record: &RequestLogRecord) {
        self(level, record);
    }
}

/// Sink that emits each record as a `tracing` event on [`ACCESS_LOG_TARGET`]
#[derive(Debug, Clone)]
pub struct TracingSink {
    service_name: String,
}

impl TracingSink {
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

macro_rules! access_event {
    ($level:expr, $service_name:expr, $record:expr) => {
        tracing::event!(
            target: ACCESS_LOG_TARGET,
            $level,
            service_name = %$service_name,
            responsetime = $record.response_time_ms,
            username = %$record.username,
            method = %$record.method,
            transaction_id = %$record.transaction_id,
            uri = %$record.uri,
            request_url = %$record.request_url,
            protocol = %$record.protocol,
            referer = %$record.referer,
            user_agent = %$record.user_agent,
            status = $record.status.as_deref().map(tracing::field::display),
            "outgoing request"
        )
    };
}

impl LogSink for TracingSink {
    fn log(&self, level: Level, record: &RequestLogRecord) {
        match level {
            Level::ERROR => access_event!(Level::ERROR, self.service_name, record),
            Level::WARN => access_event!(Level::WARN, self.service_name, record),
            Level::INFO => access_event!(Level::INFO, self.service_name, record),
            Level::DEBUG => access_event!(Level::DEBUG, self.service_name, record),
            _ => access_event!(Level::TRACE, self.service_name, record),
        }
    }
}

/// Tower layer that logs every request/response cycle of the wrapped transport
///
/// Emits exactly one [`RequestLogRecord`] at `INFO` per call, whether the
/// wrapped transport succeeds or fails. The result is returned unchanged.
#[derive(Clone)]
pub struct LoggingLayer {
    sink: Arc<dyn LogSink>,
}

impl LoggingLayer {
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Layer logging through a [`TracingSink`]
    #[must_use]
    pub fn tracing(service_name: impl Into<String>) -> Self {
        Self::new(Arc::new(TracingSink::new(service_name)))
    }
}

impl fmt::Debug for LoggingLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService {
            inner,
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Service that times the wrapped transport and emits one access record per call
#[derive(Clone)]
pub struct LoggingService<S> {
    inner: S,
    sink: Arc<dyn LogSink>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for LoggingService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let record = RequestLogRecord::capture(&req);
        let sink = Arc::clone(&self.sink);

        let start = Instant::now();
        let response = self.inner.call(req);

        Box::pin(async move {
            let result = response.await;
            let elapsed = start.elapsed();

            let status = result.as_ref().ok().map(|resp| resp.status().to_string());
            sink.log(Level::INFO, &record.finish(elapsed, status));

            result
        })
    }
}

/// Username from the URI user-info, or empty
fn username(uri: &Uri) -> &str {
    uri.authority()
        .and_then(|authority| authority.as_str().rsplit_once('@'))
        .map(|(userinfo, _)| userinfo.split(':').next().unwrap_or_default())
        .unwrap_or_default()
}

/// Full URL with any password in the user-info replaced
fn redacted_url(uri: &Uri) -> String {
    let full = uri.to_string();
    let Some(authority) = uri.authority() else {
        return full;
    };
    let Some((userinfo, host)) = authority.as_str().rsplit_once('@') else {
        return full;
    };
    let Some((user, _password)) = userinfo.split_once(':') else {
        return full;
    };
    full.replacen(
        authority.as_str(),
        &format!("{user}:{REDACTED_PASSWORD}@{host}"),
        1,
    )
}

fn protocol(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}
