//! Existence cache for content-addressed block namespaces.
//!
//! Content-addressed writers check `has(key)` before every put, so a busy
//! block namespace issues one remote existence request per candidate write.
//! [`CachedDatastore`] wraps any [`Datastore`] and answers those checks from
//! an in-memory key set once a bulk listing of the namespace completes.
//!
//! Lifecycle:
//! - Construction spawns a background task that pages through the backend's
//!   listing API and merges the resulting key snapshot into the live index.
//! - Until the merge completes, every `has` falls through to the backend;
//!   the cache is never consulted while cold.
//! - Puts and deletes routed through the wrapper keep the index in sync,
//!   including during the population window (a delete that races the bulk
//!   listing wins over the snapshot).
//! - If the listing fails, the wrapper logs a warning and stays on the
//!   fallback path for its lifetime; there is no re-initialization.
//!
//! Only namespaces matching the block-namespace convention get an index at
//! all (see [`is_cached_namespace`]); other namespaces delegate everything.

mod index;
mod lister;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::error::DatastoreError;
use crate::traits::Datastore;
use crate::types::ListPage;

use index::{ExistenceIndex, Readiness};

/// Final path segment identifying namespaces that receive an existence
/// index. Content-addressed block namespaces are the one key set expected
/// to get high-volume existence traffic; indexing only those bounds memory
/// to that key set.
pub const CACHED_NAMESPACE: &str = "blocks";

/// Whether a namespace is eligible for the existence cache.
pub fn is_cached_namespace(namespace: &str) -> bool {
    namespace.trim_matches('/').rsplit('/').next() == Some(CACHED_NAMESPACE)
}

/// Datastore wrapper that serves existence checks from an in-memory index.
///
/// Implements [`Datastore`] itself, so it is a drop-in substitute for the
/// backend it wraps. Construction must happen inside a Tokio runtime; the
/// bulk listing runs as a spawned task.
pub struct CachedDatastore<S> {
    inner: Arc<S>,
    namespace: String,
    /// Present only for eligible namespaces. Ineligible namespaces never
    /// populate or consult an index.
    index: Option<Arc<ExistenceIndex>>,
    population: Mutex<Option<JoinHandle<()>>>,
}

impl<S: Datastore + 'static> CachedDatastore<S> {
    /// Wrap a backend datastore.
    ///
    /// If `namespace` matches the block-namespace convention, a background
    /// task starts listing every key under it; `has` answers from memory
    /// once that completes. The namespace is used verbatim as the listing
    /// prefix, so it should carry its trailing separator (e.g. `/blocks/`).
    ///
    /// # Arguments
    /// * `inner` - The backend datastore
    /// * `namespace` - The prefix this instance governs
    pub fn new(inner: S, namespace: impl Into<String>) -> Self {
        let namespace: String = namespace.into();
        let inner: Arc<S> = Arc::new(inner);

        let index: Option<Arc<ExistenceIndex>> = if is_cached_namespace(&namespace) {
            Some(Arc::new(ExistenceIndex::new()))
        } else {
            None
        };

        let population: Option<JoinHandle<()>> = index.as_ref().map(|index| {
            let inner: Arc<S> = Arc::clone(&inner);
            let index: Arc<ExistenceIndex> = Arc::clone(index);
            let namespace: String = namespace.clone();
            tokio::spawn(async move {
                match lister::list_all_keys(inner.as_ref(), &namespace).await {
                    Ok(snapshot) => {
                        let total: usize = index.merge_snapshot(snapshot);
                        log::debug!(
                            "existence index ready for {}: {} keys",
                            namespace,
                            total
                        );
                    }
                    Err(e) => {
                        index.mark_failed();
                        log::warn!(
                            "existence index population failed for {}, \
                             falling back to the backend for existence checks: {}",
                            namespace,
                            e
                        );
                    }
                }
            })
        });

        Self {
            inner,
            namespace,
            index,
            population: Mutex::new(population),
        }
    }

    /// The namespace this instance governs.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether existence checks are currently served from the index.
    pub fn is_ready(&self) -> bool {
        self.index
            .as_ref()
            .map(|index| index.readiness() == Readiness::Ready)
            .unwrap_or(false)
    }

    /// Wait for the background population task to finish (successfully or
    /// not). Safe to call more than once; later calls return immediately.
    pub async fn wait_for_population(&self) {
        let handle: Option<JoinHandle<()>> = self.population.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// The key used in the index: the namespace-relative suffix, matching
    /// what the lister produces when it strips the listing prefix.
    fn index_key<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(&self.namespace).unwrap_or(key)
    }
}

#[async_trait]
impl<S: Datastore + 'static> Datastore for CachedDatastore<S> {
    async fn open(&self) -> Result<(), DatastoreError> {
        self.inner.open().await
    }

    async fn close(&self) -> Result<(), DatastoreError> {
        self.inner.close().await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), DatastoreError> {
        // Backend first. A failed put must not leave a phantom entry.
        self.inner.put(key, value).await?;
        if let Some(index) = &self.index {
            index.insert(self.index_key(key));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, DatastoreError> {
        self.inner.get(key).await
    }

    async fn has(&self, key: &str) -> Result<bool, DatastoreError> {
        if let Some(index) = &self.index {
            if let Some(exists) = index.contains(self.index_key(key)) {
                return Ok(exists);
            }
        }
        self.inner.has(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), DatastoreError> {
        let result: Result<(), DatastoreError> = self.inner.delete(key).await;
        // Invalidation happens regardless of the backend outcome.
        if let Some(index) = &self.index {
            index.remove(self.index_key(key));
        }
        result
    }

    async fn list_page(
        &self,
        prefix: &str,
        resume_after: Option<&str>,
    ) -> Result<ListPage, DatastoreError> {
        self.inner.list_page(prefix, resume_after).await
    }

    async fn query(&self, prefix: &str) -> Result<Vec<String>, DatastoreError> {
        self.inner.query(prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_namespaces_are_eligible() {
        assert!(is_cached_namespace("/blocks"));
        assert!(is_cached_namespace("/blocks/"));
        assert!(is_cached_namespace("blocks"));
        assert!(is_cached_namespace("/repo/blocks/"));
    }

    #[test]
    fn test_other_namespaces_are_not_eligible() {
        assert!(!is_cached_namespace("/datastore"));
        assert!(!is_cached_namespace("/blocks/sub"));
        assert!(!is_cached_namespace("/blockstore"));
        assert!(!is_cached_namespace(""));
        assert!(!is_cached_namespace("/"));
    }
}
