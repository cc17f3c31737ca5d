use std::time::Duration;
use thiserror::Error;

/// Transport pipeline error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// The request cannot be transmitted (e.g. relative URI without scheme or authority).
    ///
    /// Raised by the delegating transport before any extension runs and before the
    /// delegate is invoked. Never retryable.
    #[error("Malformed request '{uri}': {reason}")]
    MalformedRequest {
        /// The offending request URI
        uri: String,
        /// Diagnostic message (unstable format, for logging only)
        reason: &'static str,
    },

    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Request deadline elapsed inside the request-execution primitive
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport error (network, connection, cancellation, etc)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS setup of the default transport failed
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A transport option was applied to a transport that cannot be extended
    #[error("Expected an extensible transport; the configured transport is opaque")]
    WrongTransport,
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

/// Map tower errors to `HttpError`
///
/// Elapsed deadlines become [`HttpError::Timeout`]. Otherwise attempts to
/// extract an existing `HttpError` from the boxed error before wrapping as
/// `Transport`, so typed errors raised by inner services survive tower middleware.
pub(crate) fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }

    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(other) => HttpError::Transport(other),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fmt;

    #[derive(Debug)]
    struct TestError(&'static str);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Error for TestError {}

    #[test]
    fn test_transport_error_preserves_source() {
        let err = HttpError::Transport(Box::new(TestError("connection refused")));

        let source = err.source().expect("Transport error should have a source");
        let downcast = source
            .downcast_ref::<TestError>()
            .expect("Should be able to downcast to TestError");
        assert_eq!(downcast.0, "connection refused");
    }

    #[test]
    fn test_map_tower_error_elapsed_becomes_timeout() {
        let err: tower::BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let mapped = map_tower_error(err, Duration::from_millis(250));
        assert!(matches!(mapped, HttpError::Timeout(d) if d == Duration::from_millis(250)));
    }

    #[test]
    fn test_map_tower_error_unwraps_http_error() {
        let err: tower::BoxError = Box::new(HttpError::WrongTransport);
        let mapped = map_tower_error(err, Duration::from_secs(1));
        assert!(matches!(mapped, HttpError::WrongTransport));
    }

    #[test]
    fn test_map_tower_error_wraps_foreign_error() {
        let err: tower::BoxError = Box::new(TestError("reset by peer"));
        let mapped = map_tower_error(err, Duration::from_secs(1));
        match mapped {
            HttpError::Transport(inner) => assert_eq!(inner.to_string(), "reset by peer"),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_request_display() {
        let err = HttpError::MalformedRequest {
            uri: "/relative".to_owned(),
            reason: "missing scheme",
        };
        assert_eq!(
            err.to_string(),
            "Malformed request '/relative': missing scheme"
        );
    }
}
