//! Datastore trait - the capability interface backends implement.

use async_trait::async_trait;

use crate::error::DatastoreError;
use crate::types::ListPage;

/// Low-level key/value operations - implemented by each backend.
///
/// Keys are opaque strings. Wrappers such as
/// [`CachedDatastore`](crate::CachedDatastore) implement this same trait so
/// they are drop-in substitutes for the backend they decorate.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Open the store (connection setup, bucket existence checks).
    async fn open(&self) -> Result<(), DatastoreError>;

    /// Close the store.
    async fn close(&self) -> Result<(), DatastoreError>;

    /// Store a value under a key.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), DatastoreError>;

    /// Retrieve the value stored under a key.
    async fn get(&self, key: &str) -> Result<Vec<u8>, DatastoreError>;

    /// Check whether a key exists, without retrieving its value.
    async fn has(&self, key: &str) -> Result<bool, DatastoreError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), DatastoreError>;

    /// Fetch one page of keys under a prefix.
    ///
    /// # Arguments
    /// * `prefix` - Key prefix to list under
    /// * `resume_after` - Resume marker from the previous page's `last_key`,
    ///   or None for the first page
    async fn list_page(
        &self,
        prefix: &str,
        resume_after: Option<&str>,
    ) -> Result<ListPage, DatastoreError>;

    /// Enumerate every key under a prefix.
    async fn query(&self, prefix: &str) -> Result<Vec<String>, DatastoreError>;
}
