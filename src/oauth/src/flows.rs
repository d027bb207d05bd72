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

//! [AccessTokenProvider][crate::token::AccessTokenProvider] implementations
//! for the OAuth 2.0 grant flows.
//!
//! Both flows POST a JSON body to the configured token endpoint and return
//! the [AccessTokenResponse] verbatim. Neither flow retries, and neither
//! falls back to a different grant when the request fails.

pub mod client_credentials;
pub mod resource_owner_password;

use crate::Result;
use crate::errors::{EndpointStatusError, ErrorKind, TokenError};
use crate::token::AccessTokenResponse;
use serde_json::{Map, Value};

/// The `grant_type` of a token request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum GrantType {
    ClientCredentials,
    Password,
}

impl GrantType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            GrantType::ClientCredentials => "client_credentials",
            GrantType::Password => "password",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the JSON body of a token request.
///
/// `request` holds the standard fields of the grant. `additional` is merged
/// at the top level, in order, skipping any key already present.
pub(crate) fn request_body<T: serde::Serialize>(
    request: &T,
    additional: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let Value::Object(mut body) =
        serde_json::to_value(request).map_err(TokenError::deserialization)?
    else {
        return Err(TokenError::new(
            ErrorKind::Deserialization,
            "token requests must serialize to JSON objects",
        ));
    };
    for (key, value) in additional {
        body.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Ok(body)
}

/// The body of an unsuccessful response, or a note explaining why it is
/// missing.
fn error_body<E: std::fmt::Display>(body: std::result::Result<String, E>) -> String {
    body.unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}

/// Sends a token request to `endpoint` and parses the response.
pub(crate) async fn request_token(
    client: &reqwest::Client,
    endpoint: &str,
    client_id: &str,
    grant_type: GrantType,
    body: &Map<String, Value>,
) -> Result<AccessTokenResponse> {
    let context = || {
        format!(
            "failed to retrieve access token from {endpoint} for client {client_id} using grant type {grant_type}"
        )
    };
    tracing::debug!(endpoint, client_id, %grant_type, "requesting access token");

    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|e| TokenError::token_request(context(), e))?;

    let status = response.status();
    if !status.is_success() {
        let body = error_body(response.text().await);
        tracing::debug!(endpoint, client_id, %grant_type, %status, "access token request rejected");
        return Err(TokenError::token_request(
            context(),
            EndpointStatusError::new(status, body),
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| TokenError::token_request(context(), e))?;
    serde_json::from_slice::<AccessTokenResponse>(&bytes).map_err(TokenError::deserialization)
}
