//! Request extensions applied by the [`DelegatingTransport`](crate::DelegatingTransport).
//!
//! An [`Extension`] sees every outgoing request before it reaches the
//! request-execution primitive. Extensions only add metadata: they never change
//! the method, the URI, or anything else that affects where the request goes or
//! what it means. They are applied in registration order and must be idempotent,
//! because the same logical request may pass through the pipeline more than once.
//!
//! Every built-in extension is "first writer wins": a header already set by the
//! caller or by an earlier extension is left untouched. The order in which
//! extensions are registered therefore matters.

use crate::build_info::BUILD_VERSION;
use crate::error::HttpError;
use crate::tid::{TRANSACTION_ID_HEADER, TransactionId};
use http::header::{HeaderName, HeaderValue, USER_AGENT};
use http::request::Parts;
use std::fmt;

/// Access to a request before it is executed by the delegated transport.
///
/// Implementations must be safe to call concurrently on distinct requests and
/// must not fail: a missing precondition is a no-op.
pub trait Extension: Send + Sync {
    fn extend_request(&self, parts: &mut Parts);
}

/// Sets a header if it has not already been set.
#[derive(Clone)]
pub struct HeaderExtension {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderExtension {
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` or `HttpError::InvalidHeaderValue`
    /// if the header cannot be represented on the wire
    pub fn try_new(name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self, HttpError> {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())?;
        let value = HeaderValue::from_str(value.as_ref())?;
        Ok(Self { name, value })
    }

    /// User-Agent extension with a fixed value
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the user agent string is not valid
    pub fn user_agent(user_agent: impl AsRef<str>) -> Result<Self, HttpError> {
        let value = HeaderValue::from_str(user_agent.as_ref())?;
        Ok(Self {
            name: USER_AGENT,
            value,
        })
    }

    /// User-Agent extension of the form `PLATFORM-system-code/version`,
    /// using the crate [`BUILD_VERSION`].
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the resulting value is not valid
    pub fn standard_user_agent(platform: &str, system_code: &str) -> Result<Self, HttpError> {
        Self::standard_user_agent_with_version(platform, system_code, BUILD_VERSION)
    }

    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the resulting value is not valid
    pub fn standard_user_agent_with_version(
        platform: &str,
        system_code: &str,
        version: &str,
    ) -> Result<Self, HttpError> {
        Self::user_agent(standard_user_agent(platform, system_code, version))
    }

    #[must_use]
    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

impl fmt::Debug for HeaderExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderExtension")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl Extension for HeaderExtension {
    fn extend_request(&self, parts: &mut Parts) {
        // An empty value counts as unset
        let is_set = parts
            .headers
            .get(&self.name)
            .is_some_and(|v| !v.is_empty());
        if !is_set {
            parts.headers.insert(self.name.clone(), self.value.clone());
        }
    }
}

/// Standard User-Agent value: `UPPERCASE(platform)-lowercase(system_code)/version`.
///
/// Spaces in the version are replaced with hyphens.
#[must_use]
pub fn standard_user_agent(platform: &str, system_code: &str, version: &str) -> String {
    format!(
        "{}-{}/{}",
        platform.to_uppercase(),
        system_code.to_lowercase(),
        version.replace(' ', "-")
    )
}

/// Copies the transaction id from the request context into the
/// [`TRANSACTION_ID_HEADER`] unless that header is already set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionIdExtension;

impl Extension for TransactionIdExtension {
    fn extend_request(&self, parts: &mut Parts) {
        let Some(tid) = TransactionId::from_extensions(&parts.extensions) else {
            return;
        };

        let is_set = parts
            .headers
            .get(TRANSACTION_ID_HEADER)
            .is_some_and(|v| !v.is_empty());
        if is_set {
            return;
        }

        match HeaderValue::from_str(tid.as_str()) {
            Ok(value) => {
                parts.headers.insert(TRANSACTION_ID_HEADER, value);
            }
            Err(_) => {
                tracing::debug!(
                    transaction_id = %tid,
                    "transaction id is not a valid header value; skipping"
                );
            }
        }
    }
}
