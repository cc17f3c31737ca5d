//! Transaction id propagation.
//!
//! A transaction id correlates one logical request across services. Callers
//! attach it to the request context (`http::Extensions`) with
//! [`with_transaction_id`]; the [`TransactionIdExtension`](crate::TransactionIdExtension)
//! copies it into the [`TRANSACTION_ID_HEADER`] before the request is sent.

use http::{Extensions, Request};
use std::fmt;

/// Canonical transaction id header name
pub const TRANSACTION_ID_HEADER: &str = "X-Request-Id";

/// Transaction id carried in the request context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the transaction id from a request context, if one was attached
    #[must_use]
    pub fn from_extensions(extensions: &Extensions) -> Option<&Self> {
        extensions.get::<Self>()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Attach a transaction id to the request context
pub fn with_transaction_id<B>(req: &mut Request<B>, id: impl Into<TransactionId>) {
    req.extensions_mut().insert(id.into());
}

/// Transaction id of a request: the header value, else the context value, else empty.
#[must_use]
pub fn transaction_id_from_request<B>(req: &Request<B>) -> String {
    if let Some(header) = req
        .headers()
        .get(TRANSACTION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return header.to_owned();
    }

    TransactionId::from_extensions(req.extensions())
        .map(|tid| tid.as_str().to_owned())
        .unwrap_or_default()
}
