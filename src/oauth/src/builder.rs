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

//! Compose a grant flow, or a custom provider, with optional caching.
//!
//! # Example
//! ```
//! # use oauth_token::builder::AccessTokenProviderBuilder;
//! # use oauth_token::options::{CachingOptions, ClientCredentialsOptions};
//! # use std::time::Duration;
//! let options = ClientCredentialsOptions::new("https://auth.example.com/token", "my-client")
//!     .with_client_secret("my-secret")
//!     .with_additional_property("audience", "https://api.example.com");
//! let provider = AccessTokenProviderBuilder::client_credentials(options)
//!     .with_in_memory_caching(
//!         CachingOptions::default().with_expiration_buffer(Duration::from_secs(30)),
//!     )
//!     .build();
//! ```

use crate::cache_store::{CacheStore, InMemoryCacheStore};
use crate::flows::GrantType;
use crate::flows::client_credentials::ClientCredentialsProvider;
use crate::flows::resource_owner_password::ResourceOwnerPasswordProvider;
use crate::options::{CachingOptions, ClientCredentialsOptions, ResourceOwnerPasswordOptions};
use crate::token::AccessTokenProvider;
use crate::token_cache::CachingAccessTokenProvider;
use std::sync::Arc;

#[derive(Debug)]
enum Flow {
    ClientCredentials(ClientCredentialsOptions),
    ResourceOwnerPassword(ResourceOwnerPasswordOptions),
    Custom(Arc<dyn AccessTokenProvider>),
}

#[derive(Debug)]
enum Caching {
    Disabled,
    InMemory(CachingOptions),
    Distributed(Arc<dyn CacheStore>, CachingOptions),
}

/// Creates [AccessTokenProvider]s.
///
/// Each provider has an id, used to namespace its entries in the token
/// cache. The grant flows default to `"{grant_type}/{client_id}"`. Set an
/// explicit id with [with_provider_id][Self::with_provider_id] when two
/// providers share a client id, but not the rest of the configuration.
#[derive(Debug)]
pub struct AccessTokenProviderBuilder {
    flow: Flow,
    provider_id: Option<String>,
    client: Option<reqwest::Client>,
    caching: Caching,
}

impl AccessTokenProviderBuilder {
    fn new(flow: Flow, provider_id: Option<String>) -> Self {
        Self {
            flow,
            provider_id,
            client: None,
            caching: Caching::Disabled,
        }
    }

    /// Uses the client credentials flow.
    pub fn client_credentials(options: ClientCredentialsOptions) -> Self {
        Self::new(Flow::ClientCredentials(options), None)
    }

    /// Uses the resource owner password credentials flow.
    pub fn resource_owner_password(options: ResourceOwnerPasswordOptions) -> Self {
        Self::new(Flow::ResourceOwnerPassword(options), None)
    }

    /// Uses an application supplied provider.
    pub fn custom<I, P>(provider_id: I, provider: P) -> Self
    where
        I: Into<String>,
        P: AccessTokenProvider + 'static,
    {
        Self::new(Flow::Custom(Arc::new(provider)), Some(provider_id.into()))
    }

    /// Sets the id used in cache keys.
    pub fn with_provider_id<I: Into<String>>(mut self, provider_id: I) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Sends token requests using `client`. Ignored by custom providers.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Caches tokens in a store local to the returned provider.
    pub fn with_in_memory_caching(mut self, options: CachingOptions) -> Self {
        self.caching = Caching::InMemory(options);
        self
    }

    /// Caches tokens in `store`, typically shared across processes.
    pub fn with_distributed_caching<S>(mut self, store: S, options: CachingOptions) -> Self
    where
        S: CacheStore + 'static,
    {
        self.caching = Caching::Distributed(Arc::new(store), options);
        self
    }

    fn provider_id(&self) -> String {
        if let Some(id) = &self.provider_id {
            return id.clone();
        }
        match &self.flow {
            Flow::ClientCredentials(o) => {
                format!("{}/{}", GrantType::ClientCredentials, o.client_id())
            }
            Flow::ResourceOwnerPassword(o) => format!("{}/{}", GrantType::Password, o.client_id()),
            // Custom providers always carry an id.
            Flow::Custom(_) => String::new(),
        }
    }

    pub fn build(self) -> Arc<dyn AccessTokenProvider> {
        let provider_id = self.provider_id();
        let client = self.client.unwrap_or_default();
        let provider: Arc<dyn AccessTokenProvider> = match self.flow {
            Flow::ClientCredentials(options) => {
                Arc::new(ClientCredentialsProvider::with_client(client, options))
            }
            Flow::ResourceOwnerPassword(options) => {
                Arc::new(ResourceOwnerPasswordProvider::with_client(client, options))
            }
            Flow::Custom(provider) => provider,
        };
        tracing::debug!(
            provider_id = %provider_id,
            caching = ?self.caching,
            "building access token provider"
        );
        match self.caching {
            Caching::Disabled => provider,
            Caching::InMemory(options) => Arc::new(CachingAccessTokenProvider::new(
                provider_id,
                provider,
                InMemoryCacheStore::new(),
                options,
            )),
            Caching::Distributed(store, options) => Arc::new(CachingAccessTokenProvider::new(
                provider_id,
                provider,
                store,
                options,
            )),
        }
    }
}
