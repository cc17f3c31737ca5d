#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Extensible HTTP request transport for `ModKit`
//!
//! This crate decorates a request-execution primitive (any tower service, by
//! default a hyper client) with:
//! - An ordered pipeline of request [`Extension`]s applied before sending
//! - User-Agent injection (fixed or the standard `PLATFORM-system-code/version`)
//! - Transaction id propagation from the request context to `X-Request-Id`
//! - Optional access logging: one record per request/response cycle, with timing
//!
//! The decorated transport keeps the primitive's contract: same request and
//! response types, errors passed through unchanged. It adds no retries,
//! pooling or TLS of its own.
//!
//! # Ordering
//!
//! Extensions run in registration order and never overwrite a header that is
//! already set, so the first registered User-Agent wins. Installing logging
//! wraps whatever delegate is current at that moment.
//!
//! # Example
//!
//! ```ignore
//! use modkit_http_transport::{ClientOption, HttpClient, TracingSink, with_transaction_id};
//! use std::time::Duration;
//!
//! let client = HttpClient::new([
//!     ClientOption::timeout(Duration::from_secs(2)),
//!     ClientOption::logging(TracingSink::new("my-service")),
//!     ClientOption::sys_info("PAC", "my-service"),
//! ])?;
//!
//! let mut req = http::Request::get("https://example.com/api").body(Default::default())?;
//! with_transaction_id(&mut req, "tid_1234");
//! let resp = client.execute(req).await?;
//! ```

mod build_info;
mod builder;
mod client;
mod config;
mod connector;
mod error;
mod extension;
mod layers;
mod response;
pub mod tid;
mod transport;

pub use build_info::BUILD_VERSION;
pub use builder::{ClientOption, HttpClientBuilder};
pub use client::HttpClient;
pub use config::{
    DEFAULT_PLATFORM, DEFAULT_SYSTEM_CODE, DEFAULT_TIMEOUT, PLATFORM_ENV, SYSTEM_CODE_ENV,
    SysInfo,
};
pub use connector::default_transport;
pub use error::HttpError;
pub use extension::{Extension, HeaderExtension, TransactionIdExtension, standard_user_agent};
pub use layers::{
    ACCESS_LOG_TARGET, LogSink, LoggingLayer, LoggingService, RequestLogRecord, TracingSink,
};
pub use response::{ResponseBody, into_response_body};
pub use tid::{TRANSACTION_ID_HEADER, TransactionId, with_transaction_id};
pub use transport::{BoxTransport, DelegatingTransport, TransportFuture, TransportOption};
