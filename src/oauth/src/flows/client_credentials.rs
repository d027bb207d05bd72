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

//! The OAuth 2.0 [client credentials] flow.
//!
//! The client authenticates with its own id and secret, there is no user
//! involved. This is the usual flow for service-to-service calls.
//!
//! ```no_run
//! # use oauth_token::flows::client_credentials::ClientCredentialsProvider;
//! # use oauth_token::options::ClientCredentialsOptions;
//! # use oauth_token::token::AccessTokenProvider;
//! # async fn sample() -> Result<(), oauth_token::errors::TokenError> {
//! let options = ClientCredentialsOptions::new("https://auth.example.com/token", "my-client")
//!     .with_client_secret("my-secret");
//! let provider = ClientCredentialsProvider::new(options);
//! let response = provider.access_token(&["orders.read"]).await?;
//! println!("token expires in {}s", response.expires_in());
//! # Ok(()) }
//! ```
//!
//! [client credentials]: https://datatracker.ietf.org/doc/html/rfc6749#section-4.4

use super::{GrantType, request_body, request_token};
use crate::Result;
use crate::options::ClientCredentialsOptions;
use crate::token::{AccessTokenProvider, AccessTokenResponse};

/// Acquires access tokens using the client credentials grant.
#[derive(Clone, Debug)]
pub struct ClientCredentialsProvider {
    client: reqwest::Client,
    options: ClientCredentialsOptions,
}

impl ClientCredentialsProvider {
    /// Creates a provider with a default HTTP client.
    pub fn new(options: ClientCredentialsOptions) -> Self {
        Self::with_client(reqwest::Client::new(), options)
    }

    /// Creates a provider that sends token requests using `client`.
    ///
    /// Use this to share connection pools, or to configure proxies and
    /// timeouts for the token endpoint.
    pub fn with_client(client: reqwest::Client, options: ClientCredentialsOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &ClientCredentialsOptions {
        &self.options
    }
}

#[derive(serde::Serialize)]
struct ClientCredentialsRequest<'a> {
    grant_type: GrantType,
    client_id: &'a str,
    client_secret: &'a str,
    scope: String,
}

#[async_trait::async_trait]
impl AccessTokenProvider for ClientCredentialsProvider {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessTokenResponse> {
        self.options.validate()?;
        let request = ClientCredentialsRequest {
            grant_type: GrantType::ClientCredentials,
            client_id: &self.options.client_id,
            client_secret: &self.options.client_secret,
            scope: scopes.join(" "),
        };
        let body = request_body(&request, &self.options.additional_properties)?;
        request_token(
            &self.client,
            &self.options.token_endpoint,
            &self.options.client_id,
            request.grant_type,
            &body,
        )
        .await
    }
}
