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

//! OAuth 2.0 access tokens for service-to-service HTTP calls.
//!
//! This crate acquires access tokens from an OAuth 2.0 authorization server,
//! caches them until shortly before they expire, and attaches them to
//! outgoing HTTP requests as `Authorization: Bearer` headers.
//!
//! The pieces compose through the [token::AccessTokenProvider] trait:
//!
//! - [flows] implements the [client credentials] and the [resource owner
//!   password credentials] grants.
//! - [token_cache::CachingAccessTokenProvider] wraps any provider and stores
//!   its responses in a [cache_store::CacheStore].
//! - [bearer::BearerAuthLayer] is a [tower] middleware, and
//!   [http::AuthorizedClient] wraps a [reqwest::Client], both set the header
//!   on each request.
//! - [builder::AccessTokenProviderBuilder] puts a flow and a cache together.
//!
//! ```
//! # use oauth_token::builder::AccessTokenProviderBuilder;
//! # use oauth_token::http::AuthorizedClient;
//! # use oauth_token::options::{CachingOptions, ClientCredentialsOptions};
//! let options = ClientCredentialsOptions::new("https://auth.example.com/token", "my-client")
//!     .with_client_secret("my-secret");
//! let provider = AccessTokenProviderBuilder::client_credentials(options)
//!     .with_in_memory_caching(CachingOptions::default())
//!     .build();
//! let client = AuthorizedClient::new(provider, ["orders.read", "orders.write"]);
//! ```
//!
//! Nothing in this crate retries. Failures are reported as
//! [errors::TokenError], applications decide whether to try again.
//!
//! [client credentials]: https://datatracker.ietf.org/doc/html/rfc6749#section-4.4
//! [resource owner password credentials]: https://datatracker.ietf.org/doc/html/rfc6749#section-4.3

pub mod errors;

/// Access token responses and the provider traits.
pub mod token;

pub mod options;

/// The OAuth 2.0 grant flows.
pub mod flows;

pub mod cache_store;

pub mod token_cache;

pub mod bearer;

pub mod http;

pub mod builder;

/// A `Result` alias where the `Err` case is [errors::TokenError].
pub type Result<T> = std::result::Result<T, errors::TokenError>;
