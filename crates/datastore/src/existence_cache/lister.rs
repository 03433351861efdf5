//! Paginated bulk listing of every key under a prefix.

use crate::error::DatastoreError;
use crate::traits::Datastore;
use crate::types::ListPage;

/// Enumerate every key currently stored under `prefix`, following resume
/// markers until the backend reports the listing complete.
///
/// Returned keys have `prefix` stripped. Page order is preserved, though
/// the existence index treats the result as an unordered set.
///
/// # Errors
/// Any single page failure aborts the whole listing; partial results are
/// discarded. The error is wrapped as [`DatastoreError::Listing`], keeping
/// only the stable code of the page failure.
pub(crate) async fn list_all_keys<S: Datastore + ?Sized>(
    store: &S,
    prefix: &str,
) -> Result<Vec<String>, DatastoreError> {
    let mut keys: Vec<String> = Vec::new();
    let mut resume_after: Option<String> = None;

    loop {
        let page: ListPage = store
            .list_page(prefix, resume_after.as_deref())
            .await
            .map_err(|e| DatastoreError::Listing {
                code: e.code().to_string(),
            })?;

        for full_key in &page.keys {
            let key: &str = full_key.strip_prefix(prefix).unwrap_or(full_key);
            keys.push(key.to_string());
        }

        if !page.truncated {
            break;
        }
        match page.last_key {
            Some(marker) => resume_after = Some(marker),
            // A truncated page without a resume marker cannot make progress.
            None => {
                return Err(DatastoreError::Listing {
                    code: "ERR_BAD_PAGE".to_string(),
                })
            }
        }
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend serving a fixed key set in pages of a configurable size,
    /// optionally failing on a chosen page.
    struct PagedStore {
        keys: Vec<String>,
        page_size: usize,
        fail_on_page: Option<usize>,
        pages_served: AtomicUsize,
    }

    impl PagedStore {
        fn new(prefix: &str, names: &[&str], page_size: usize) -> Self {
            Self {
                keys: names.iter().map(|n| format!("{}{}", prefix, n)).collect(),
                page_size,
                fail_on_page: None,
                pages_served: AtomicUsize::new(0),
            }
        }

        fn failing_on_page(mut self, page: usize) -> Self {
            self.fail_on_page = Some(page);
            self
        }
    }

    #[async_trait]
    impl Datastore for PagedStore {
        async fn open(&self) -> Result<(), DatastoreError> {
            Ok(())
        }

        async fn close(&self) -> Result<(), DatastoreError> {
            Ok(())
        }

        async fn put(&self, _key: &str, _value: &[u8]) -> Result<(), DatastoreError> {
            unimplemented!("not used by the lister")
        }

        async fn get(&self, key: &str) -> Result<Vec<u8>, DatastoreError> {
            Err(DatastoreError::NotFound {
                key: key.to_string(),
            })
        }

        async fn has(&self, _key: &str) -> Result<bool, DatastoreError> {
            unimplemented!("not used by the lister")
        }

        async fn delete(&self, _key: &str) -> Result<(), DatastoreError> {
            unimplemented!("not used by the lister")
        }

        async fn list_page(
            &self,
            prefix: &str,
            resume_after: Option<&str>,
        ) -> Result<ListPage, DatastoreError> {
            let page_index: usize = self.pages_served.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_page == Some(page_index) {
                return Err(DatastoreError::Network {
                    message: "listing request failed".to_string(),
                    retryable: true,
                });
            }

            let mut remaining: Vec<&String> = self
                .keys
                .iter()
                .filter(|k| k.starts_with(prefix))
                .filter(|k| resume_after.map_or(true, |m| k.as_str() > m))
                .collect();
            remaining.sort();

            let truncated: bool = remaining.len() > self.page_size;
            let page_keys: Vec<String> = remaining
                .into_iter()
                .take(self.page_size)
                .cloned()
                .collect();
            Ok(ListPage::new(page_keys, truncated))
        }

        async fn query(&self, prefix: &str) -> Result<Vec<String>, DatastoreError> {
            list_all_keys(self, prefix).await
        }
    }

    #[tokio::test]
    async fn test_single_page_listing() {
        let store = PagedStore::new("/blocks/", &["a", "b", "c"], 10);
        let keys = list_all_keys(&store, "/blocks/").await.unwrap();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_complete_for_every_page_size() {
        let names: Vec<String> = (0..17).map(|i| format!("key{:02}", i)).collect();
        let name_refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();

        for page_size in 1..=names.len() {
            let store = PagedStore::new("/blocks/", &name_refs, page_size);
            let mut keys = list_all_keys(&store, "/blocks/").await.unwrap();
            assert_eq!(keys.len(), names.len(), "page size {}", page_size);
            keys.sort();
            keys.dedup();
            assert_eq!(keys, names, "page size {}", page_size);
        }
    }

    #[tokio::test]
    async fn test_prefix_is_stripped() {
        let store = PagedStore::new("/blocks/", &["abc123"], 10);
        let keys = list_all_keys(&store, "/blocks/").await.unwrap();
        assert_eq!(keys, vec!["abc123"]);
    }

    #[tokio::test]
    async fn test_empty_namespace_lists_nothing() {
        let store = PagedStore::new("/blocks/", &[], 10);
        let keys = list_all_keys(&store, "/blocks/").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_page_failure_aborts_without_partial_results() {
        let store = PagedStore::new("/blocks/", &["a", "b", "c", "d"], 2).failing_on_page(1);
        let err = list_all_keys(&store, "/blocks/").await.unwrap_err();
        match err {
            DatastoreError::Listing { code } => assert_eq!(code, "ERR_NETWORK"),
            other => panic!("expected listing error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_page_failure() {
        let store = PagedStore::new("/blocks/", &["a"], 1).failing_on_page(0);
        let err = list_all_keys(&store, "/blocks/").await.unwrap_err();
        assert_eq!(err.code(), "ERR_LISTING");
    }
}
