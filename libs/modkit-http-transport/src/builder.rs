use crate::config::DEFAULT_TIMEOUT;
use crate::connector::default_transport;
use crate::error::{HttpError, map_tower_error};
use crate::extension::Extension;
use crate::layers::LogSink;
use crate::response::ResponseBody;
use crate::transport::{BoxTransport, DelegatingTransport, TransportOption};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::fmt;
use std::time::Duration;
use tower::timeout::TimeoutLayer;
use tower::{Service, ServiceBuilder, ServiceExt};

/// Named client configuration step.
///
/// Options are applied in the order supplied. Transport options act on the
/// client's [`DelegatingTransport`]; see [`TransportOption`] for how their order
/// matters.
#[derive(Debug)]
#[non_exhaustive]
pub enum ClientOption {
    /// Request deadline; the last one supplied wins
    Timeout(Duration),
    Transport(TransportOption),
}

impl ClientOption {
    #[must_use]
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout(timeout)
    }

    /// Produce one access record per outgoing request
    #[must_use]
    pub fn logging(sink: impl LogSink + 'static) -> Self {
        Self::Transport(TransportOption::logging(sink))
    }

    /// Set a fixed `User-Agent` on requests that carry none
    #[must_use]
    pub fn user_agent(user_agent: impl Into<String>) -> Self {
        Self::Transport(TransportOption::user_agent(user_agent))
    }

    /// Set the standard `PLATFORM-system-code/version` `User-Agent` on requests that carry none
    #[must_use]
    pub fn sys_info(platform: impl Into<String>, system_code: impl Into<String>) -> Self {
        Self::Transport(TransportOption::standard_user_agent(platform, system_code))
    }

    #[must_use]
    pub fn extension(extension: impl Extension + 'static) -> Self {
        Self::Transport(TransportOption::extension(extension))
    }
}

impl From<TransportOption> for ClientOption {
    fn from(option: TransportOption) -> Self {
        Self::Transport(option)
    }
}

/// Where the client's transport comes from
enum TransportSource {
    /// [`default_transport`], decorated by a [`DelegatingTransport`]
    Default,
    /// Caller-supplied primitive, decorated by a [`DelegatingTransport`]
    Base(BoxTransport),
    /// Caller-supplied transport used as-is; transport options are rejected
    Opaque(BoxTransport),
}

/// Builder for constructing an [`HttpClient`](crate::HttpClient).
///
/// ```ignore
/// let client = HttpClient::builder()
///     .timeout(Duration::from_secs(2))
///     .logging(TracingSink::new("my-service"))
///     .sys_info("PAC", "my-service")
///     .build()?;
/// ```
pub struct HttpClientBuilder {
    source: TransportSource,
    options: Vec<ClientOption>,
}

impl HttpClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: TransportSource::Default,
            options: Vec::new(),
        }
    }

    /// Decorate `primitive` instead of the default hyper transport
    #[must_use]
    pub fn base_transport<S>(mut self, primitive: S) -> Self
    where
        S: Service<Request<Full<Bytes>>, Response = Response<ResponseBody>, Error = HttpError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        self.source = TransportSource::Base(BoxTransport::new(primitive));
        self
    }

    /// Use a pre-built transport as-is.
    ///
    /// Only [`ClientOption::Timeout`] applies; any transport option makes
    /// [`build`](Self::build) fail with [`HttpError::WrongTransport`].
    #[must_use]
    pub fn opaque_transport<S>(mut self, transport: S) -> Self
    where
        S: Service<Request<Full<Bytes>>, Response = Response<ResponseBody>, Error = HttpError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        self.source = TransportSource::Opaque(BoxTransport::new(transport));
        self
    }

    #[must_use]
    pub fn option(mut self, option: impl Into<ClientOption>) -> Self {
        self.options.push(option.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: impl IntoIterator<Item = ClientOption>) -> Self {
        self.options.extend(options);
        self
    }

    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.option(ClientOption::timeout(timeout))
    }

    #[must_use]
    pub fn logging(self, sink: impl LogSink + 'static) -> Self {
        self.option(ClientOption::logging(sink))
    }

    #[must_use]
    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        self.option(ClientOption::user_agent(user_agent))
    }

    #[must_use]
    pub fn sys_info(self, platform: impl Into<String>, system_code: impl Into<String>) -> Self {
        self.option(ClientOption::sys_info(platform, system_code))
    }

    #[must_use]
    pub fn extension(self, extension: impl Extension + 'static) -> Self {
        self.option(ClientOption::extension(extension))
    }

    /// Build the client, applying options in order.
    ///
    /// The deadline wraps the request-execution primitive itself, so an elapsed
    /// timeout surfaces as a delegated transport error ([`HttpError::Timeout`])
    /// and is still seen by access logging.
    ///
    /// # Errors
    /// - `HttpError::Tls` if the default transport cannot be configured
    /// - `HttpError::InvalidHeaderValue` if a user agent option is not a valid header value
    /// - `HttpError::WrongTransport` if a transport option targets an opaque transport
    pub fn build(self) -> Result<crate::HttpClient, HttpError> {
        let mut timeout = DEFAULT_TIMEOUT;
        let mut transport_options = Vec::new();
        for option in self.options {
            match option {
                ClientOption::Timeout(value) => timeout = value,
                ClientOption::Transport(option) => transport_options.push(option),
            }
        }

        let (primitive, extensible) = match self.source {
            TransportSource::Default => (default_transport()?, true),
            TransportSource::Base(primitive) => (primitive, true),
            TransportSource::Opaque(transport) => (transport, false),
        };

        let timed = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .service(primitive)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout));
        let timed = BoxTransport::new(timed);

        let service = if extensible {
            let mut transport = DelegatingTransport::new(timed);
            transport.add_options(transport_options)?;
            BoxTransport::new(transport)
        } else {
            if !transport_options.is_empty() {
                return Err(HttpError::WrongTransport);
            }
            timed
        };

        Ok(crate::HttpClient { service, timeout })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            TransportSource::Default => "default",
            TransportSource::Base(_) => "base",
            TransportSource::Opaque(_) => "opaque",
        };
        f.debug_struct("HttpClientBuilder")
            .field("source", &source)
            .field("options", &self.options)
            .finish()
    }
}
