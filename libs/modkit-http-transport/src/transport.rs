//! The delegating transport: the composition root of the pipeline.
//!
//! A [`DelegatingTransport`] applies its registered [`Extension`]s, in
//! registration order, to every request and then forwards the request to its
//! delegate. The delegate is the request-execution primitive, possibly wrapped
//! by a [`LoggingLayer`]. Results and errors of the delegate are returned
//! unchanged.
//!
//! Configuration (adding extensions, installing logging) happens before the
//! transport is shared. Clones share the extension list read-only.

use crate::error::HttpError;
use crate::extension::{Extension, HeaderExtension, TransactionIdExtension};
use crate::layers::{LogSink, LoggingLayer};
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Request, Response, Uri};
use http_body_util::Full;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

/// Type-erased request-execution primitive.
///
/// Any tower service taking `Request<Full<Bytes>>` and producing
/// `Response<ResponseBody>` / [`HttpError`] can be boxed into it.
pub type BoxTransport =
    BoxCloneSyncService<Request<Full<Bytes>>, Response<ResponseBody>, HttpError>;

/// Future returned by [`DelegatingTransport`]
pub type TransportFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpError>> + Send>>;

/// Named configuration step for a [`DelegatingTransport`].
///
/// Options are applied in the order supplied. Several options may act on the
/// same header; the first one to set it wins.
#[non_exhaustive]
pub enum TransportOption {
    /// Wrap the current delegate with a [`LoggingLayer`]
    Logging(Arc<dyn LogSink>),
    /// Set a fixed `User-Agent` if none is present
    UserAgent(String),
    /// Set `PLATFORM-system-code/version` as `User-Agent` if none is present
    StandardUserAgent {
        platform: String,
        system_code: String,
    },
    /// Copy the transaction id from the request context into `X-Request-Id`
    TransactionIdFromContext,
    /// Register a custom extension
    Extension(Arc<dyn Extension>),
}

impl TransportOption {
    #[must_use]
    pub fn logging(sink: impl LogSink + 'static) -> Self {
        Self::Logging(Arc::new(sink))
    }

    #[must_use]
    pub fn user_agent(user_agent: impl Into<String>) -> Self {
        Self::UserAgent(user_agent.into())
    }

    #[must_use]
    pub fn standard_user_agent(platform: impl Into<String>, system_code: impl Into<String>) -> Self {
        Self::StandardUserAgent {
            platform: platform.into(),
            system_code: system_code.into(),
        }
    }

    #[must_use]
    pub fn extension(extension: impl Extension + 'static) -> Self {
        Self::Extension(Arc::new(extension))
    }
}

impl fmt::Debug for TransportOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logging(_) => f.write_str("Logging"),
            Self::UserAgent(ua) => f.debug_tuple("UserAgent").field(ua).finish(),
            Self::StandardUserAgent {
                platform,
                system_code,
            } => f
                .debug_struct("StandardUserAgent")
                .field("platform", platform)
                .field("system_code", system_code)
                .finish(),
            Self::TransactionIdFromContext => f.write_str("TransactionIdFromContext"),
            Self::Extension(_) => f.write_str("Extension"),
        }
    }
}

/// Pre-processes requests with the configured extensions, then delegates them
/// to the request-execution primitive.
#[derive(Clone)]
pub struct DelegatingTransport {
    delegate: BoxTransport,
    extensions: Arc<Vec<Arc<dyn Extension>>>,
}

impl DelegatingTransport {
    /// Transport over `primitive` with the [`TransactionIdExtension`] installed
    #[must_use]
    pub fn new<S>(primitive: S) -> Self
    where
        S: Service<Request<Full<Bytes>>, Response = Response<ResponseBody>, Error = HttpError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let mut transport = Self::without_extensions(primitive);
        transport.add_extension(TransactionIdExtension);
        transport
    }

    /// Transport over `primitive` with an empty pipeline
    #[must_use]
    pub fn without_extensions<S>(primitive: S) -> Self
    where
        S: Service<Request<Full<Bytes>>, Response = Response<ResponseBody>, Error = HttpError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Self {
            delegate: BoxTransport::new(primitive),
            extensions: Arc::new(Vec::new()),
        }
    }

    /// Like [`Self::new`], with access logging around `primitive`
    #[must_use]
    pub fn with_logging<S>(primitive: S, sink: Arc<dyn LogSink>) -> Self
    where
        S: Service<Request<Full<Bytes>>, Response = Response<ResponseBody>, Error = HttpError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let mut transport = Self::new(primitive);
        transport.install_logging(sink);
        transport
    }

    /// Append an extension to the pipeline
    pub fn add_extension(&mut self, extension: impl Extension + 'static) -> &mut Self {
        self.push_extension(Arc::new(extension));
        self
    }

    /// Apply options in the order supplied
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if a user agent option produces
    /// an invalid header value. Options before the failing one stay applied.
    pub fn add_options(
        &mut self,
        options: impl IntoIterator<Item = TransportOption>,
    ) -> Result<&mut Self, HttpError> {
        for option in options {
            self.apply(option)?;
        }
        Ok(self)
    }

    /// Number of registered extensions
    #[must_use]
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    fn apply(&mut self, option: TransportOption) -> Result<(), HttpError> {
        match option {
            TransportOption::Logging(sink) => self.install_logging(sink),
            TransportOption::UserAgent(user_agent) => {
                self.add_extension(HeaderExtension::user_agent(user_agent)?);
            }
            TransportOption::StandardUserAgent {
                platform,
                system_code,
            } => {
                self.add_extension(HeaderExtension::standard_user_agent(
                    &platform,
                    &system_code,
                )?);
            }
            TransportOption::TransactionIdFromContext => {
                self.add_extension(TransactionIdExtension);
            }
            TransportOption::Extension(extension) => self.push_extension(extension),
        }
        Ok(())
    }

    fn push_extension(&mut self, extension: Arc<dyn Extension>) {
        Arc::make_mut(&mut self.extensions).push(extension);
    }

    /// Wrap whatever delegate is current at this moment
    fn install_logging(&mut self, sink: Arc<dyn LogSink>) {
        let current = self.delegate.clone();
        self.delegate = BoxTransport::new(LoggingLayer::new(sink).layer(current));
    }
}

impl fmt::Debug for DelegatingTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingTransport")
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

impl Service<Request<Full<Bytes>>> for DelegatingTransport {
    type Response = Response<ResponseBody>;
    type Error = HttpError;
    type Future = TransportFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.delegate.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
        if let Err(err) = check_transmittable(req.uri()) {
            tracing::debug!(error = %err, "rejecting malformed request");
            return Box::pin(std::future::ready(Err(err)));
        }

        let (mut parts, body) = req.into_parts();
        for extension in self.extensions.iter() {
            extension.extend_request(&mut parts);
        }

        self.delegate.call(Request::from_parts(parts, body))
    }
}

/// A request can only be sent to an absolute URI
fn check_transmittable(uri: &Uri) -> Result<(), HttpError> {
    let reason = if uri.scheme().is_none() {
        "missing scheme"
    } else if uri.authority().is_none() {
        "missing authority"
    } else {
        return Ok(());
    };

    Err(HttpError::MalformedRequest {
        uri: uri.to_string(),
        reason,
    })
}
