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

//! The OAuth 2.0 [resource owner password credentials] flow.
//!
//! This flow is NOT RECOMMENDED. The application handles the user's password,
//! so use it only as a flow of last resort, when other flows (such as
//! [client credentials]) are not viable.
//!
//! [client credentials]: super::client_credentials
//! [resource owner password credentials]: https://datatracker.ietf.org/doc/html/rfc6749#section-4.3

use super::{GrantType, request_body, request_token};
use crate::Result;
use crate::options::ResourceOwnerPasswordOptions;
use crate::token::{AccessTokenProvider, AccessTokenResponse};

/// Acquires access tokens on behalf of a user, using their username and
/// password.
///
/// Prefer other flows when possible, see the
/// [module docs](crate::flows::resource_owner_password).
#[derive(Clone, Debug)]
pub struct ResourceOwnerPasswordProvider {
    client: reqwest::Client,
    options: ResourceOwnerPasswordOptions,
}

impl ResourceOwnerPasswordProvider {
    pub fn new(options: ResourceOwnerPasswordOptions) -> Self {
        Self::with_client(reqwest::Client::new(), options)
    }

    /// Creates a provider that sends token requests using `client`.
    pub fn with_client(client: reqwest::Client, options: ResourceOwnerPasswordOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &ResourceOwnerPasswordOptions {
        &self.options
    }
}

#[derive(serde::Serialize)]
struct PasswordRequest<'a> {
    grant_type: GrantType,
    client_id: &'a str,
    client_secret: &'a str,
    scope: String,
    username: &'a str,
    password: &'a str,
}

#[async_trait::async_trait]
impl AccessTokenProvider for ResourceOwnerPasswordProvider {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessTokenResponse> {
        self.options.validate()?;
        let request = PasswordRequest {
            grant_type: GrantType::Password,
            client_id: &self.options.client_id,
            client_secret: &self.options.client_secret,
            scope: scopes.join(" "),
            username: &self.options.username,
            password: &self.options.password,
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

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::json;

    type TestResult = anyhow::Result<()>;

    fn options(server: &Server) -> ResourceOwnerPasswordOptions {
        ResourceOwnerPasswordOptions::new(server.url("/oauth2/token").to_string(), "test-client-id")
            .with_client_secret("test-client-secret")
            .with_resource_owner("test-username", "test-password")
    }

    #[tokio::test]
    async fn posts_request_as_configured() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/oauth2/token"),
                request::body(json_decoded(eq(json!({
                    "grant_type": "password",
                    "client_id": "test-client-id",
                    "client_secret": "test-client-secret",
                    "scope": "openid profile",
                    "username": "test-username",
                    "password": "test-password",
                    "tenant": "test-tenant",
                })))),
            ])
            .respond_with(json_encoded(json!({
                "access_token": "test-access-token",
                "token_type": "Bearer",
                "expires_in": 300,
                "scope": "openid profile",
                "refresh_token": "test-refresh-token",
            }))),
        );

        let options = options(&server).with_additional_property("tenant", "test-tenant");
        let provider = ResourceOwnerPasswordProvider::new(options);
        let response = provider.access_token(&["openid", "profile"]).await?;
        assert_eq!(response.access_token(), "test-access-token");
        assert_eq!(response.token_type(), "Bearer");
        assert_eq!(response.expires_in(), 300);
        assert_eq!(response.scope(), "openid profile");
        assert_eq!(response.extra()["refresh_token"], "test-refresh-token");
        Ok(())
    }

    #[tokio::test]
    async fn additional_properties_cannot_replace_credentials() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::body(json_decoded(eq(json!({
                "grant_type": "password",
                "client_id": "test-client-id",
                "client_secret": "test-client-secret",
                "scope": "",
                "username": "test-username",
                "password": "test-password",
            })))))
            .respond_with(json_encoded(json!({"access_token": "test-access-token"}))),
        );

        let options = options(&server)
            .with_additional_property("username", "impostor")
            .with_additional_property("grant_type", "client_credentials");
        let provider = ResourceOwnerPasswordProvider::new(options);
        provider.access_token(&[]).await?;
        Ok(())
    }

    #[tokio::test]
    async fn unsuccessful_request() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/oauth2/token"))
                .respond_with(status_code(401).body(r#"{"error":"invalid_grant"}"#)),
        );

        let provider = ResourceOwnerPasswordProvider::new(options(&server));
        let e = provider.access_token(&["openid"]).await.unwrap_err();
        assert!(e.is_token_request(), "{e:?}");
        let msg = e.to_string();
        assert!(msg.contains("test-client-id"), "{msg}");
        assert!(msg.contains("grant type password"), "{msg}");
        assert!(msg.contains("invalid_grant"), "{msg}");
        assert!(!msg.contains("test-password"), "{msg}");
        Ok(())
    }

    #[tokio::test]
    async fn missing_username_sends_no_request() -> TestResult {
        let server = Server::run();
        let options = ResourceOwnerPasswordOptions::new(
            server.url("/oauth2/token").to_string(),
            "test-client-id",
        );
        let provider = ResourceOwnerPasswordProvider::new(options);
        let e = provider.access_token(&["openid"]).await.unwrap_err();
        assert!(e.is_invalid_configuration(), "{e:?}");
        Ok(())
    }

    #[test]
    fn debug() {
        let options =
            ResourceOwnerPasswordOptions::new("https://example.com/token", "test-client-id")
                .with_resource_owner("test-username", "test-password");
        let provider = ResourceOwnerPasswordProvider::new(options);
        let fmt = format!("{provider:?}");
        assert!(fmt.contains("test-username"), "{fmt}");
        assert!(!fmt.contains("test-password"), "{fmt}");
    }
}
