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

//! Configuration for the access token providers and the token cache.
//!
//! Options can be created in code using the `with_*` functions, or loaded
//! from a JSON configuration value:
//!
//! ```
//! # use oauth_token::options::ClientCredentialsOptions;
//! let options = ClientCredentialsOptions::from_json(serde_json::json!({
//!     "token_endpoint": "https://auth.example.com/oauth2/token",
//!     "client_id": "my-client",
//!     "client_secret": "my-secret",
//!     "additional_properties": { "audience": "https://api.example.com" },
//! }))?;
//! # Ok::<(), oauth_token::errors::TokenError>(())
//! ```
//!
//! Required values are checked when a token is requested, not when the
//! options are created.

use crate::Result;
use crate::errors::TokenError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// The default value for [CachingOptions::expiration_buffer].
pub const DEFAULT_EXPIRATION_BUFFER: Duration = Duration::from_secs(5);

/// Options for the [client credentials] flow.
///
/// [client credentials]: https://datatracker.ietf.org/doc/html/rfc6749#section-4.4
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientCredentialsOptions {
    pub(crate) token_endpoint: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) additional_properties: Map<String, Value>,
}

impl ClientCredentialsOptions {
    /// Creates options to request tokens from `token_endpoint` for `client_id`.
    pub fn new<E, C>(token_endpoint: E, client_id: C) -> Self
    where
        E: Into<String>,
        C: Into<String>,
    {
        Self {
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Loads the options from a JSON configuration value.
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            TokenError::invalid_configuration(format!(
                "cannot parse client credentials options: {e}"
            ))
        })
    }

    /// Sets the client secret.
    pub fn with_client_secret<S: Into<String>>(mut self, client_secret: S) -> Self {
        self.client_secret = client_secret.into();
        self
    }

    /// Adds a field to the token request body.
    ///
    /// Additional properties are merged at the top level of the request, in
    /// the order they were added. They cannot replace the standard fields of
    /// the grant.
    pub fn with_additional_property<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.additional_properties.insert(key.into(), value.into());
        self
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn additional_properties(&self) -> &Map<String, Value> {
        &self.additional_properties
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_client(&self.token_endpoint, &self.client_id)
    }
}

impl std::fmt::Debug for ClientCredentialsOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsOptions")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("additional_properties", &self.additional_properties)
            .finish()
    }
}

/// Options for the [resource owner password credentials] flow.
///
/// [resource owner password credentials]: https://datatracker.ietf.org/doc/html/rfc6749#section-4.3
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResourceOwnerPasswordOptions {
    pub(crate) token_endpoint: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) additional_properties: Map<String, Value>,
}

impl ResourceOwnerPasswordOptions {
    /// Creates options to request tokens from `token_endpoint` for `client_id`.
    pub fn new<E, C>(token_endpoint: E, client_id: C) -> Self
    where
        E: Into<String>,
        C: Into<String>,
    {
        Self {
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Loads the options from a JSON configuration value.
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            TokenError::invalid_configuration(format!(
                "cannot parse resource owner password options: {e}"
            ))
        })
    }

    /// Sets the client secret.
    pub fn with_client_secret<S: Into<String>>(mut self, client_secret: S) -> Self {
        self.client_secret = client_secret.into();
        self
    }

    /// Sets the resource owner credentials.
    pub fn with_resource_owner<U, P>(mut self, username: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Adds a field to the token request body.
    ///
    /// See [ClientCredentialsOptions::with_additional_property].
    pub fn with_additional_property<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.additional_properties.insert(key.into(), value.into());
        self
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn additional_properties(&self) -> &Map<String, Value> {
        &self.additional_properties
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_client(&self.token_endpoint, &self.client_id)?;
        if self.username.is_empty() {
            return Err(TokenError::invalid_configuration(
                "the resource owner username is required",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResourceOwnerPasswordOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceOwnerPasswordOptions")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("username", &self.username)
            .field("password", &"[censored]")
            .field("additional_properties", &self.additional_properties)
            .finish()
    }
}

fn validate_client(token_endpoint: &str, client_id: &str) -> Result<()> {
    if token_endpoint.is_empty() {
        return Err(TokenError::invalid_configuration(
            "the token endpoint is required",
        ));
    }
    if let Err(e) = reqwest::Url::parse(token_endpoint) {
        return Err(TokenError::invalid_configuration(format!(
            "the token endpoint `{token_endpoint}` is not a valid URL: {e}"
        )));
    }
    if client_id.is_empty() {
        return Err(TokenError::invalid_configuration(
            "the client id is required",
        ));
    }
    Ok(())
}

/// Options for [CachingAccessTokenProvider][crate::token_cache::CachingAccessTokenProvider].
#[derive(Clone, Debug, PartialEq)]
pub struct CachingOptions {
    expiration_buffer: Duration,
}

impl Default for CachingOptions {
    fn default() -> Self {
        Self {
            expiration_buffer: DEFAULT_EXPIRATION_BUFFER,
        }
    }
}

impl CachingOptions {
    /// Sets how long before the token expiration the cached entry is
    /// discarded.
    ///
    /// A token that is valid when read from the cache may expire before it
    /// reaches the resource server. The buffer must be smaller than the
    /// lifetime of the tokens issued by the authorization server, otherwise
    /// requests fail with an error where
    /// [TokenError::is_invalid_configuration] is `true`.
    pub fn with_expiration_buffer(mut self, expiration_buffer: Duration) -> Self {
        self.expiration_buffer = expiration_buffer;
        self
    }

    pub fn expiration_buffer(&self) -> Duration {
        self.expiration_buffer
    }
}
