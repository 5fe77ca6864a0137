//! Lazily-created, per-key provider client
//!
//! The handler keeps one authenticated client for the key it was last asked
//! for. The client is built on first use, reused afterwards, and thrown away
//! when the stored credentials change. Construction is guarded by a mutex,
//! so concurrent first use still builds exactly one client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{TranslatorError, TranslatorResult};
use crate::provider::{DeepLProvider, TranslationProvider};

/// Builds a provider client for an authentication key
pub trait ProviderFactory: Send + Sync {
    fn create(&self, auth_key: &str) -> TranslatorResult<Arc<dyn TranslationProvider>>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&str) -> TranslatorResult<Arc<dyn TranslationProvider>> + Send + Sync,
{
    fn create(&self, auth_key: &str) -> TranslatorResult<Arc<dyn TranslationProvider>> {
        self(auth_key)
    }
}

/// Factory for real DeepL clients
#[derive(Debug, Clone)]
pub struct DeepLFactory {
    timeout: Duration,
    base_url: Option<String>,
}

impl DeepLFactory {
    pub fn new(timeout: Duration, base_url: Option<String>) -> Self {
        Self { timeout, base_url }
    }
}

impl ProviderFactory for DeepLFactory {
    fn create(&self, auth_key: &str) -> TranslatorResult<Arc<dyn TranslationProvider>> {
        let provider = match &self.base_url {
            Some(url) => DeepLProvider::with_base_url(auth_key.to_string(), self.timeout, url.clone())?,
            None => DeepLProvider::new(auth_key.to_string(), self.timeout)?,
        };
        Ok(Arc::new(provider))
    }
}

struct CachedClient {
    auth_key: String,
    client: Arc<dyn TranslationProvider>,
}

/// Holds at most one client, bound to the key it was created with
pub struct ClientCache {
    factory: Arc<dyn ProviderFactory>,
    slot: Mutex<Option<CachedClient>>,
}

impl ClientCache {
    pub fn new(factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
        }
    }

    /// Client for `auth_key`, creating it on first use
    ///
    /// A cached client for a different key is replaced.
    ///
    /// # Errors
    ///
    /// `MissingCredentials` for a blank key, or whatever the factory fails with.
    pub async fn client(&self, auth_key: &str) -> TranslatorResult<Arc<dyn TranslationProvider>> {
        if auth_key.trim().is_empty() {
            return Err(TranslatorError::MissingCredentials);
        }

        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.auth_key == auth_key {
                return Ok(Arc::clone(&cached.client));
            }
        }

        let client = self.factory.create(auth_key)?;
        tracing::debug!(provider = client.provider_name(), "Created provider client");
        *slot = Some(CachedClient {
            auth_key: auth_key.to_string(),
            client: Arc::clone(&client),
        });

        Ok(client)
    }

    /// Drop the cached client; the next call builds a fresh one
    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }

    pub async fn is_initialized(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

impl fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockMode, MockProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_cache() -> (Arc<ClientCache>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let factory = move |_key: &str| -> TranslatorResult<Arc<dyn TranslationProvider>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockProvider::new(MockMode::Suffix)))
        };
        (Arc::new(ClientCache::new(Arc::new(factory))), created)
    }

    #[tokio::test]
    async fn test_client_created_lazily_once() {
        let (cache, created) = counting_cache();
        assert!(!cache.is_initialized().await);
        assert_eq!(created.load(Ordering::SeqCst), 0);

        let a = cache.client("key").await.unwrap();
        let b = cache.client("key").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(cache.is_initialized().await);
    }

    #[tokio::test]
    async fn test_new_key_replaces_client() {
        let (cache, created) = counting_cache();
        let a = cache.client("one").await.unwrap();
        let b = cache.client("two").await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let (cache, created) = counting_cache();
        cache.client("key").await.unwrap();
        cache.invalidate().await;
        assert!(!cache.is_initialized().await);
        cache.client("key").await.unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_key_is_missing_credentials() {
        let (cache, created) = counting_cache();
        assert!(matches!(
            cache.client("  ").await,
            Err(TranslatorError::MissingCredentials)
        ));
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_builds_one_client() {
        let (cache, created) = counting_cache();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.client("key").await.map(|_| ()) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deepl_factory_rejects_blank_key() {
        let factory = DeepLFactory::new(Duration::from_secs(1), None);
        assert!(matches!(
            factory.create(""),
            Err(TranslatorError::Config(_))
        ));
        assert!(factory.create("abc:fx").is_ok());
    }
}
