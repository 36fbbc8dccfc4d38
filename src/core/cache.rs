//! Process-wide cache of loaded sentiment models.
//!
//! Loading a classifier means downloading and memory-mapping hundreds of
//! megabytes of weights, so pipelines built for the same model and device
//! share one instance. Cached models are cheap to clone (their weights sit
//! behind an `Arc`).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Trait implemented by model option types to generate a stable cache key.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

type CacheStorage = HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>;

/// A thread-safe cache for model instances, keyed by model type and a string key.
pub struct ModelCache {
    cache: Arc<Mutex<CacheStorage>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the cached model for `key`, or run `loader` and cache its result.
    ///
    /// The lock is not held while `loader` runs, so two concurrent misses on
    /// the same key may both load; the later insert wins.
    pub async fn get_or_create<M, Fut, F>(&self, key: &str, loader: F) -> anyhow::Result<M>
    where
        M: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<M>>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        {
            let cache = self.cache.lock().await;
            if let Some(model) = cache
                .get(&cache_key)
                .and_then(|cached| cached.downcast_ref::<M>())
            {
                tracing::debug!(key, "model cache hit");
                return Ok(model.clone());
            }
        }

        let model = loader().await?;

        {
            let mut cache = self.cache.lock().await;
            cache.insert(cache_key, Arc::new(model.clone()) as Arc<dyn Any + Send + Sync>);
        }

        Ok(model)
    }

    /// Drop every cached model.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL_CACHE: once_cell::sync::Lazy<ModelCache> =
    once_cell::sync::Lazy::new(ModelCache::new);

/// Get a reference to the global model cache.
pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL_CACHE
}
