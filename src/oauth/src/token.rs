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

//! Types and traits to work with OAuth 2.0 [access token responses].
//!
//! [access token responses]: https://datatracker.ietf.org/doc/html/rfc6749#section-5.1

use crate::Result;
use crate::errors::TokenError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The successful response of an OAuth 2.0 token endpoint.
///
/// Values are immutable once constructed. Fields returned by the
/// authorization server beyond the ones defined in RFC 6749 are preserved, in
/// order, and available via [AccessTokenResponse::extra].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    scope: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl AccessTokenResponse {
    /// Creates a response holding `access_token`.
    ///
    /// The remaining fields default to empty values, use the `with_*`
    /// functions to set them. This is mostly useful for custom providers and
    /// tests.
    pub fn new<T: Into<String>>(access_token: T) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: String::new(),
            expires_in: 0,
            scope: String::new(),
            extra: Map::new(),
        }
    }

    /// Sets the token type, typically `Bearer`.
    pub fn with_token_type<T: Into<String>>(mut self, token_type: T) -> Self {
        self.token_type = token_type.into();
        self
    }

    /// Sets the token lifetime, in seconds.
    pub fn with_expires_in(mut self, expires_in: u64) -> Self {
        self.expires_in = expires_in;
        self
    }

    /// Sets the space-delimited list of granted scopes.
    pub fn with_scope<T: Into<String>>(mut self, scope: T) -> Self {
        self.scope = scope.into();
        self
    }

    /// Adds a provider-specific field.
    pub fn with_extra<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The access token issued by the authorization server.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The type of the token, e.g. `Bearer`.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The lifetime of the token, in seconds, as reported by the server.
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    /// The lifetime of the token as a [Duration].
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.expires_in)
    }

    /// The space-delimited scopes granted to the token.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Any additional fields in the response.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

impl std::fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("access_token", &"[censored]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Produces OAuth 2.0 access tokens for a set of scopes.
///
/// The grant flows in this crate, the caching decorator, and any application
/// type implementing this trait are interchangeable.
///
/// # Example
/// ```
/// # use oauth_token::errors::TokenError;
/// # use oauth_token::token::{AccessTokenProvider, AccessTokenResponse};
/// #[derive(Debug)]
/// struct Fixed;
///
/// #[async_trait::async_trait]
/// impl AccessTokenProvider for Fixed {
///     async fn access_token(&self, _scopes: &[&str]) -> Result<AccessTokenResponse, TokenError> {
///         Ok(AccessTokenResponse::new("test-only").with_expires_in(3600))
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait AccessTokenProvider: std::fmt::Debug + Send + Sync {
    /// Returns a valid access token for `scopes`.
    ///
    /// The scopes are sent to the authorization server joined by a single
    /// space, in the order given.
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessTokenResponse>;
}

#[async_trait::async_trait]
impl<T> AccessTokenProvider for Arc<T>
where
    T: AccessTokenProvider + ?Sized,
{
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessTokenResponse> {
        self.as_ref().access_token(scopes).await
    }
}

#[async_trait::async_trait]
impl<T> AccessTokenProvider for Box<T>
where
    T: AccessTokenProvider + ?Sized,
{
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessTokenResponse> {
        self.as_ref().access_token(scopes).await
    }
}

/// Extension functions available on every [AccessTokenProvider].
#[async_trait::async_trait]
pub trait AccessTokenProviderExt: AccessTokenProvider {
    /// Like [AccessTokenProvider::access_token], but stops as soon as
    /// `cancellation` is triggered.
    ///
    /// Any in-flight request to the token endpoint is dropped, and the
    /// function returns an error where [TokenError::is_cancelled] is `true`.
    async fn access_token_with_cancellation(
        &self,
        scopes: &[&str],
        cancellation: &CancellationToken,
    ) -> Result<AccessTokenResponse> {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(TokenError::cancelled()),
            result = self.access_token(scopes) => result,
        }
    }
}

impl<T> AccessTokenProviderExt for T where T: AccessTokenProvider + ?Sized {}
