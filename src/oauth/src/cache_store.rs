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

//! Storage backends for cached access tokens.
//!
//! The [InMemoryCacheStore] keeps entries in the process memory. To share
//! tokens across processes implement [CacheStore] on top of a distributed
//! cache (Redis, memcached, etc.). The store only sees opaque strings, it
//! does not need to understand the token format.

use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
// Using tokio's clock makes expiration testable with a paused runtime.
use tokio::sync::Mutex;
use tokio::time::Instant;

// Entries whose time to live overflows the clock expire after this period.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A key-value store with per-entry expiration.
///
/// Implementations must not return an entry once its time to live has
/// elapsed. Failures should be reported as [TokenError]s of kind
/// [ErrorKind::CacheStore].
///
/// [TokenError]: crate::errors::TokenError
/// [ErrorKind::CacheStore]: crate::errors::ErrorKind::CacheStore
#[async_trait::async_trait]
pub trait CacheStore: std::fmt::Debug + Send + Sync {
    /// Returns the value stored for `key`, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` for `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String, time_to_live: Duration) -> Result<()>;
}

#[async_trait::async_trait]
impl<T> CacheStore for Arc<T>
where
    T: CacheStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.as_ref().get(key).await
    }

    async fn set(&self, key: &str, value: String, time_to_live: Duration) -> Result<()> {
        self.as_ref().set(key, value, time_to_live).await
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// A [CacheStore] local to the process.
///
/// Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of entries, including any expired entry not yet pruned.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, time_to_live: Duration) -> Result<()> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(time_to_live)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| now < e.expires_at);
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
