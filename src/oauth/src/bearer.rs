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

//! A [tower] middleware that authorizes outgoing HTTP requests.
//!
//! The middleware requests an access token for a fixed list of scopes before
//! each call, and sets the `Authorization: Bearer <token>` header. Wrap the
//! provider in a [CachingAccessTokenProvider] to avoid a token request per
//! call.
//!
//! ```
//! # use oauth_token::bearer::BearerAuthLayer;
//! # use oauth_token::cache_store::InMemoryCacheStore;
//! # use oauth_token::flows::client_credentials::ClientCredentialsProvider;
//! # use oauth_token::options::{CachingOptions, ClientCredentialsOptions};
//! # use oauth_token::token_cache::CachingAccessTokenProvider;
//! # use tower::Layer;
//! let options = ClientCredentialsOptions::new("https://auth.example.com/token", "my-client");
//! let provider = CachingAccessTokenProvider::new(
//!     "orders-api",
//!     ClientCredentialsProvider::new(options),
//!     InMemoryCacheStore::new(),
//!     CachingOptions::default(),
//! );
//! let layer = BearerAuthLayer::new(provider, ["orders.read"]);
//! let service = layer.layer(tower::service_fn(|_request: http::Request<String>| async move {
//!     // Send the request using your favorite HTTP client.
//!     Ok::<_, std::convert::Infallible>(http::Response::new(String::new()))
//! }));
//! ```
//!
//! [CachingAccessTokenProvider]: crate::token_cache::CachingAccessTokenProvider

use crate::Result;
use crate::errors::{ErrorKind, TokenError};
use crate::token::{AccessTokenProvider, AccessTokenProviderExt};
use http::HeaderValue;
use http::header::AUTHORIZATION;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;
use tower::{BoxError, Layer, Service};

/// Obtains `Authorization` header values from a provider.
#[derive(Clone, Debug)]
pub(crate) struct BearerToken {
    provider: Arc<dyn AccessTokenProvider>,
    scopes: Arc<[String]>,
    cancellation: Option<CancellationToken>,
}

impl BearerToken {
    pub(crate) fn new<P, I, S>(provider: P, scopes: I) -> Self
    where
        P: AccessTokenProvider + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider: Arc::new(provider),
            scopes: scopes.into_iter().map(Into::into).collect(),
            cancellation: None,
        }
    }

    pub(crate) fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub(crate) fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub(crate) async fn header_value(&self) -> Result<HeaderValue> {
        let scopes = self.scopes.iter().map(String::as_str).collect::<Vec<_>>();
        let response = match &self.cancellation {
            Some(cancellation) => {
                self.provider
                    .access_token_with_cancellation(&scopes, cancellation)
                    .await?
            }
            None => self.provider.access_token(&scopes).await?,
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {}", response.access_token()))
            .map_err(|e| {
                TokenError::with_source(
                    ErrorKind::Deserialization,
                    "the access token is not a valid HTTP header value",
                    e,
                )
            })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Sets the `Authorization` header, leaving all other headers untouched.
    pub(crate) async fn authorize(&self, headers: &mut http::HeaderMap) -> Result<()> {
        let value = self.header_value().await.inspect_err(|e| {
            tracing::debug!(scopes = ?self.scopes, error = %e, "cannot authorize the request");
        })?;
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// A [Layer] that wraps services with [BearerAuth].
#[derive(Clone, Debug)]
pub struct BearerAuthLayer {
    token: BearerToken,
}

impl BearerAuthLayer {
    /// Creates a layer requesting tokens for `scopes` from `provider`.
    pub fn new<P, I, S>(provider: P, scopes: I) -> Self
    where
        P: AccessTokenProvider + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            token: BearerToken::new(provider, scopes),
        }
    }

    /// Aborts pending token requests once `cancellation` is triggered.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.token = self.token.with_cancellation(cancellation);
        self
    }

    pub fn scopes(&self) -> &[String] {
        self.token.scopes()
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuth {
            inner,
            token: self.token.clone(),
        }
    }
}

/// A [Service] that sets the `Authorization` header before calling the inner
/// service.
///
/// If the token cannot be obtained the inner service is not called, and the
/// returned error wraps the [TokenError]. Responses are returned unchanged.
#[derive(Clone, Debug)]
pub struct BearerAuth<S> {
    inner: S,
    token: BearerToken,
}

impl<S, B> Service<http::Request<B>> for BearerAuth<S>
where
    S: Service<http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Into<BoxError>,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<S::Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut request: http::Request<B>) -> Self::Future {
        // The service that was polled ready must handle the request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let token = self.token.clone();
        Box::pin(async move {
            if let Err(e) = token.authorize(request.headers_mut()).await {
                return Err(BoxError::from(e));
            }
            inner.call(request).await.map_err(Into::<BoxError>::into)
        })
    }
}
