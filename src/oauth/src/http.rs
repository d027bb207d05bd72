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

//! An HTTP client that authorizes every request with a bearer token.

use crate::bearer::BearerToken;
use crate::errors::TokenError;
use crate::token::AccessTokenProvider;
use tokio_util::sync::CancellationToken;

/// The error type for [AuthorizedClient].
#[derive(thiserror::Error, Debug)]
pub enum BearerError {
    /// The access token could not be obtained. The request was not sent.
    #[error("cannot authorize the request: {0}")]
    Token(#[from] TokenError),
    /// The request could not be built, or the HTTP transport failed.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl BearerError {
    /// The request was not sent because no access token was available.
    pub fn is_token(&self) -> bool {
        matches!(self, BearerError::Token(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, BearerError::Transport(_))
    }
}

/// Wraps a [reqwest::Client], setting `Authorization: Bearer <token>` on each
/// request.
///
/// Only the `Authorization` header is modified. Responses, including error
/// status codes, are returned as-is.
#[derive(Clone, Debug)]
pub struct AuthorizedClient {
    client: reqwest::Client,
    token: BearerToken,
}

impl AuthorizedClient {
    /// Creates a client requesting tokens for `scopes` from `provider`.
    pub fn new<P, I, S>(provider: P, scopes: I) -> Self
    where
        P: AccessTokenProvider + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_client(reqwest::Client::new(), provider, scopes)
    }

    /// Like [new][AuthorizedClient::new], sending requests with `client`.
    pub fn with_client<P, I, S>(client: reqwest::Client, provider: P, scopes: I) -> Self
    where
        P: AccessTokenProvider + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
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

    /// Starts building a request. Send it with [AuthorizedClient::send].
    pub fn request<U: reqwest::IntoUrl>(
        &self,
        method: reqwest::Method,
        url: U,
    ) -> reqwest::RequestBuilder {
        self.client.request(method, url)
    }

    /// Builds and sends the request.
    pub async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BearerError> {
        self.execute(builder.build()?).await
    }

    /// Authorizes and sends `request`.
    pub async fn execute(
        &self,
        mut request: reqwest::Request,
    ) -> Result<reqwest::Response, BearerError> {
        self.token.authorize(request.headers_mut()).await?;
        Ok(self.client.execute(request).await?)
    }
}
