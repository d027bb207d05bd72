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

//! A caching decorator for [AccessTokenProvider]s.

use crate::Result;
use crate::cache_store::CacheStore;
use crate::errors::TokenError;
use crate::options::CachingOptions;
use crate::token::{AccessTokenProvider, AccessTokenResponse};
use std::time::Duration;

/// Caches the responses of another [AccessTokenProvider].
///
/// Entries are keyed by the provider id and the requested scopes, in order.
/// `["a", "b"]` and `["b", "a"]` are cached separately. Each entry expires
/// `expires_in - expiration_buffer` after it is written.
///
/// The key is `"{provider_id}:{scopes}"`, with the scopes joined by `#`, and
/// scopes are not escaped. A scope containing `#` shares its entry with the
/// scopes it would split into, `["a#b"]` and `["a", "b"]` get the same token.
/// Avoid `#` in scopes, or use separate providers for such scopes.
///
/// Concurrent misses for the same key are not coalesced, each caller fetches
/// a token and the last write wins.
///
/// # Example
/// ```
/// # use oauth_token::cache_store::InMemoryCacheStore;
/// # use oauth_token::flows::client_credentials::ClientCredentialsProvider;
/// # use oauth_token::options::{CachingOptions, ClientCredentialsOptions};
/// # use oauth_token::token_cache::CachingAccessTokenProvider;
/// let options = ClientCredentialsOptions::new("https://auth.example.com/token", "my-client");
/// let provider = CachingAccessTokenProvider::new(
///     "orders-api",
///     ClientCredentialsProvider::new(options),
///     InMemoryCacheStore::new(),
///     CachingOptions::default(),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct CachingAccessTokenProvider<P, S> {
    provider_id: String,
    inner: P,
    store: S,
    options: CachingOptions,
}

impl<P, S> CachingAccessTokenProvider<P, S>
where
    P: AccessTokenProvider,
    S: CacheStore,
{
    /// Wraps `inner`, caching its responses in `store`.
    ///
    /// `provider_id` must be stable across restarts, and unique among the
    /// providers sharing `store`.
    pub fn new<I>(provider_id: I, inner: P, store: S, options: CachingOptions) -> Self
    where
        I: Into<String>,
    {
        Self {
            provider_id: provider_id.into(),
            inner,
            store,
            options,
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn cache_key(&self, scopes: &[&str]) -> String {
        format!("{}:{}", self.provider_id, scopes.join("#"))
    }

    fn time_to_live(&self, response: &AccessTokenResponse) -> Result<Duration> {
        let buffer = self.options.expiration_buffer();
        match response.lifetime().checked_sub(buffer) {
            Some(ttl) if !ttl.is_zero() => Ok(ttl),
            _ => Err(TokenError::invalid_configuration(format!(
                "the expiration buffer ({buffer:?}) must be smaller than the token lifetime ({}s) for provider `{}`",
                response.expires_in(),
                self.provider_id
            ))),
        }
    }

    async fn cached(&self, key: &str) -> Result<Option<AccessTokenResponse>> {
        let Some(value) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<AccessTokenResponse>(&value) {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring corrupt access token cache entry");
                Ok(None)
            }
        }
    }
}

#[async_trait::async_trait]
impl<P, S> AccessTokenProvider for CachingAccessTokenProvider<P, S>
where
    P: AccessTokenProvider,
    S: CacheStore,
{
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessTokenResponse> {
        let key = self.cache_key(scopes);
        if let Some(response) = self.cached(&key).await? {
            tracing::debug!(key, "access token cache hit");
            return Ok(response);
        }
        tracing::debug!(key, "access token cache miss");

        let response = self.inner.access_token(scopes).await?;
        let ttl = self.time_to_live(&response)?;
        let value = serde_json::to_string(&response).map_err(TokenError::deserialization)?;
        self.store.set(&key, value, ttl).await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_store::InMemoryCacheStore;
    use crate::errors::ErrorKind;
    use crate::token::tests::SequenceProvider;
    use std::sync::Arc;
    use test_case::test_case;

    mockall::mock! {
        #[derive(Debug)]
        Store {}

        #[async_trait::async_trait]
        impl CacheStore for Store {
            async fn get(&self, key: &str) -> Result<Option<String>>;
            async fn set(&self, key: &str, value: String, time_to_live: Duration) -> Result<()>;
        }
    }

    fn caching(
        expires_in: u64,
        buffer: Duration,
    ) -> CachingAccessTokenProvider<Arc<SequenceProvider>, InMemoryCacheStore> {
        CachingAccessTokenProvider::new(
            "test-provider",
            Arc::new(SequenceProvider::new(expires_in)),
            InMemoryCacheStore::new(),
            CachingOptions::default().with_expiration_buffer(buffer),
        )
    }

    #[tokio::test]
    async fn cache_hit() {
        let provider = caching(3600, Duration::from_secs(5));
        let first = provider.access_token(&["scope1", "scope2"]).await.unwrap();
        let second = provider.access_token(&["scope1", "scope2"]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.access_token(), "token-1");
        assert_eq!(provider.inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_expiration() {
        let provider = caching(60, Duration::from_secs(10));
        let first = provider.access_token(&["scope1"]).await.unwrap();
        assert_eq!(first.access_token(), "token-1");

        tokio::time::advance(Duration::from_secs(49)).await;
        let got = provider.access_token(&["scope1"]).await.unwrap();
        assert_eq!(got.access_token(), "token-1");

        tokio::time::advance(Duration::from_secs(1)).await;
        let got = provider.access_token(&["scope1"]).await.unwrap();
        assert_eq!(got.access_token(), "token-2");
        assert_eq!(provider.inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_buffer_uses_full_lifetime() {
        let provider = caching(3600, Duration::ZERO);
        provider.access_token(&["scope1"]).await.unwrap();

        tokio::time::advance(Duration::from_secs(3599)).await;
        let got = provider.access_token(&["scope1"]).await.unwrap();
        assert_eq!(got.access_token(), "token-1");

        tokio::time::advance(Duration::from_secs(1)).await;
        let got = provider.access_token(&["scope1"]).await.unwrap();
        assert_eq!(got.access_token(), "token-2");
    }

    #[test_case(60, 60; "buffer equals lifetime")]
    #[test_case(60, 120; "buffer exceeds lifetime")]
    #[test_case(0, 0; "zero lifetime")]
    #[tokio::test]
    async fn buffer_not_smaller_than_lifetime(expires_in: u64, buffer: u64) {
        let mut store = MockStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));
        store.expect_set().never();

        let provider = CachingAccessTokenProvider::new(
            "test-provider",
            SequenceProvider::new(expires_in),
            store,
            CachingOptions::default().with_expiration_buffer(Duration::from_secs(buffer)),
        );
        let e = provider.access_token(&["scope1"]).await.unwrap_err();
        assert!(e.is_invalid_configuration(), "{e:?}");
        assert!(e.to_string().contains("test-provider"), "{e}");
    }

    #[tokio::test]
    async fn writes_serialized_response() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .withf(|key| key.to_string() == "test-provider:scope1#scope2")
            .times(1)
            .returning(|_| Ok(None));
        store
            .expect_set()
            .withf(|key, value, ttl| {
                let response = serde_json::from_str::<AccessTokenResponse>(value).unwrap();
                key.to_string() == "test-provider:scope1#scope2"
                    && response.access_token() == "token-1"
                    && *ttl == Duration::from_secs(3595)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let provider = CachingAccessTokenProvider::new(
            "test-provider",
            SequenceProvider::new(3600),
            store,
            CachingOptions::default(),
        );
        let got = provider.access_token(&["scope1", "scope2"]).await.unwrap();
        assert_eq!(got.access_token(), "token-1");
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some("{not json".to_string())));
        store.expect_set().times(1).returning(|_, _, _| Ok(()));

        let provider = CachingAccessTokenProvider::new(
            "test-provider",
            SequenceProvider::new(3600),
            store,
            CachingOptions::default(),
        );
        let got = provider.access_token(&["scope1"]).await.unwrap();
        assert_eq!(got.access_token(), "token-1");
        assert_eq!(provider.inner.calls(), 1);
    }

    #[tokio::test]
    async fn store_errors() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Err(TokenError::new(ErrorKind::CacheStore, "test-only")));

        let inner = Arc::new(SequenceProvider::new(3600));
        let provider = CachingAccessTokenProvider::new(
            "test-provider",
            inner.clone(),
            store,
            CachingOptions::default(),
        );
        let e = provider.access_token(&["scope1"]).await.unwrap_err();
        assert!(e.is_cache_store(), "{e:?}");
        assert_eq!(inner.calls(), 0);
    }

    #[tokio::test]
    async fn scope_order_matters() {
        let provider = caching(3600, Duration::from_secs(5));
        let ab = provider.access_token(&["a", "b"]).await.unwrap();
        let ba = provider.access_token(&["b", "a"]).await.unwrap();
        assert_ne!(ab.access_token(), ba.access_token());
        assert_eq!(provider.inner.calls(), 2);
    }

    #[tokio::test]
    async fn unbounded_lifetime() {
        let provider = caching(u64::MAX, Duration::from_secs(5));
        let first = provider.access_token(&["scope1"]).await.unwrap();
        let second = provider.access_token(&["scope1"]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.expires_in(), u64::MAX);
        assert_eq!(provider.inner.calls(), 1);
    }

    #[tokio::test]
    async fn scopes_are_not_escaped() {
        let provider = caching(3600, Duration::from_secs(5));
        let joined = provider.access_token(&["a#b"]).await.unwrap();
        let split = provider.access_token(&["a", "b"]).await.unwrap();
        assert_eq!(joined, split);
        assert_eq!(split.scope(), "a#b");
        assert_eq!(provider.inner.calls(), 1);
    }

    #[tokio::test]
    async fn providers_share_a_store() {
        let store = InMemoryCacheStore::new();
        let inner = Arc::new(SequenceProvider::new(3600));
        let orders = CachingAccessTokenProvider::new(
            "orders",
            inner.clone(),
            store.clone(),
            CachingOptions::default(),
        );
        let billing = CachingAccessTokenProvider::new(
            "billing",
            inner.clone(),
            store.clone(),
            CachingOptions::default(),
        );
        let orders_again = CachingAccessTokenProvider::new(
            "orders",
            inner.clone(),
            store.clone(),
            CachingOptions::default(),
        );

        let first = orders.access_token(&["scope1"]).await.unwrap();
        let second = billing.access_token(&["scope1"]).await.unwrap();
        assert_ne!(first.access_token(), second.access_token());
        let third = orders_again.access_token(&["scope1"]).await.unwrap();
        assert_eq!(first, third);
        assert_eq!(inner.calls(), 2);
        assert_eq!(store.len().await, 2);
    }
}
