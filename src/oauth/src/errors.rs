// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors returned while acquiring access tokens.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result};
use std::sync::Arc;

/// Represents an error acquiring an access token.
///
/// None of these errors are retried by this crate. Applications that want to
/// retry token acquisition should wrap the provider in their own retry loop,
/// typically after checking [TokenError::is_token_request].
#[derive(Clone, Debug)]
pub struct TokenError {
    kind: ErrorKind,
    message: String,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

/// The category of a [TokenError].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The token endpoint was unreachable or returned a non-success status.
    TokenRequest,
    /// The token endpoint response could not be parsed.
    Deserialization,
    /// The provider, or the cache wrapping it, is misconfigured.
    InvalidConfiguration,
    /// The caller cancelled the operation.
    Cancelled,
    /// The cache backend failed to read or write an entry.
    CacheStore,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let msg = match self {
            ErrorKind::TokenRequest => "the access token request failed",
            ErrorKind::Deserialization => "cannot parse the access token response",
            ErrorKind::InvalidConfiguration => "invalid configuration",
            ErrorKind::Cancelled => "the operation was cancelled",
            ErrorKind::CacheStore => "the access token cache failed",
        };
        f.write_str(msg)
    }
}

impl TokenError {
    /// Creates a new error with a message and no underlying source.
    ///
    /// Custom [AccessTokenProvider][crate::token::AccessTokenProvider]
    /// implementations use this to report their own failures.
    pub fn new<M: Into<String>>(kind: ErrorKind, message: M) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new error wrapping the underlying `source`.
    pub fn with_source<M, E>(kind: ErrorKind, message: M, source: E) -> Self
    where
        M: Into<String>,
        E: Error + Send + Sync + 'static,
    {
        Self {
            kind,
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The token endpoint was unreachable or rejected the request.
    pub fn is_token_request(&self) -> bool {
        self.kind == ErrorKind::TokenRequest
    }

    /// The token endpoint returned a body that is not a valid token response.
    pub fn is_deserialization(&self) -> bool {
        self.kind == ErrorKind::Deserialization
    }

    /// Required options are missing, or the cache expiration buffer is not
    /// smaller than the token lifetime.
    pub fn is_invalid_configuration(&self) -> bool {
        self.kind == ErrorKind::InvalidConfiguration
    }

    /// The operation was cancelled before it completed.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    /// The cache backend failed.
    pub fn is_cache_store(&self) -> bool {
        self.kind == ErrorKind::CacheStore
    }

    pub(crate) fn token_request<M, E>(message: M, source: E) -> Self
    where
        M: Into<String>,
        E: Error + Send + Sync + 'static,
    {
        Self::with_source(ErrorKind::TokenRequest, message, source)
    }

    pub(crate) fn deserialization<E>(source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::with_source(
            ErrorKind::Deserialization,
            "the access token response is malformed",
            source,
        )
    }

    pub(crate) fn invalid_configuration<M: Into<String>>(message: M) -> Self {
        Self::new(ErrorKind::InvalidConfiguration, message)
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(
            ErrorKind::Cancelled,
            "the caller cancelled the access token request",
        )
    }
}

impl Error for TokenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }
        Ok(())
    }
}

/// The token endpoint answered with a non-success status code.
///
/// Available as the [source][Error::source] of [TokenError]s of kind
/// [ErrorKind::TokenRequest].
#[derive(thiserror::Error, Debug)]
#[error("the token endpoint returned {status}: {body}")]
pub struct EndpointStatusError {
    status: http::StatusCode,
    body: String,
}

impl EndpointStatusError {
    pub(crate) fn new(status: http::StatusCode, body: String) -> Self {
        Self { status, body }
    }

    /// The HTTP status code returned by the token endpoint.
    pub fn status(&self) -> http::StatusCode {
        self.status
    }

    /// The response body, typically an RFC 6749 error object.
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ErrorKind::TokenRequest)]
    #[test_case(ErrorKind::Deserialization)]
    #[test_case(ErrorKind::InvalidConfiguration)]
    #[test_case(ErrorKind::Cancelled)]
    #[test_case(ErrorKind::CacheStore)]
    fn predicates(kind: ErrorKind) {
        let e = TokenError::new(kind, "test-only");
        assert_eq!(e.kind(), kind);
        assert_eq!(e.is_token_request(), kind == ErrorKind::TokenRequest);
        assert_eq!(e.is_deserialization(), kind == ErrorKind::Deserialization);
        assert_eq!(
            e.is_invalid_configuration(),
            kind == ErrorKind::InvalidConfiguration
        );
        assert_eq!(e.is_cancelled(), kind == ErrorKind::Cancelled);
        assert_eq!(e.is_cache_store(), kind == ErrorKind::CacheStore);
    }

    #[test]
    fn fmt() {
        let e = TokenError::invalid_configuration("test-only-err-123");
        let got = format!("{e}");
        assert!(got.contains("test-only-err-123"), "{got}");
        assert!(got.contains("invalid configuration"), "{got}");
        assert!(e.source().is_none(), "{e:?}");
    }

    #[test]
    fn source() {
        let status = EndpointStatusError::new(http::StatusCode::BAD_REQUEST, "epic fail".into());
        let e = TokenError::token_request("test-only-context", status);
        let got = format!("{e}");
        assert!(got.contains("test-only-context"), "{got}");
        assert!(got.contains("400 Bad Request"), "{got}");

        let source = e.source().expect("token request errors have a source");
        let status = source
            .downcast_ref::<EndpointStatusError>()
            .expect("source is an EndpointStatusError");
        assert_eq!(status.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(status.body(), "epic fail");
    }
}
