//! Default request-execution primitive.
//!
//! A hyper client over a rustls connector. Connection pooling, protocol
//! negotiation and TLS are left to the libraries' defaults; the pipeline only
//! decorates this primitive.

use crate::error::HttpError;
use crate::response::into_response_body;
use crate::transport::BoxTransport;
use bytes::Bytes;
use http_body_util::Full;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::sync::Arc;
use tower::ServiceExt;

/// Build the default transport (http and https, webpki roots).
///
/// # Errors
/// Returns `HttpError::Tls` if the TLS connector cannot be configured
pub fn default_transport() -> Result<BoxTransport, HttpError> {
    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(crypto_provider())
        // rustls::Error implements Error + Send + Sync
        .map_err(|e| HttpError::Tls(Box::new(e)))?
        .https_or_http()
        .enable_all_versions()
        .build();

    // pool_timer is required for the pool idle timeout to take effect
    let client = Client::builder(TokioExecutor::new())
        .pool_timer(TokioTimer::new())
        .build::<_, Full<Bytes>>(https);

    let service = client
        .map_response(into_response_body::<hyper::body::Incoming>)
        .map_err(HttpError::from);

    Ok(BoxTransport::new(service))
}

/// Use the process-wide crypto provider if one is installed, else aws-lc-rs
/// without installing it globally.
fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}
