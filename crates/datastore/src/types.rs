//! Shared types for datastore operations.

/// One page of a paginated key listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Keys on this page, in the backend's listing order. Keys are in
    /// datastore key space (backend storage prefixes already stripped).
    pub keys: Vec<String>,
    /// Whether more keys remain after this page.
    pub truncated: bool,
    /// The last key of this page, used as the resume marker for the next
    /// request when `truncated` is true.
    pub last_key: Option<String>,
}

impl ListPage {
    /// Create a page from its keys, deriving the resume marker.
    ///
    /// # Arguments
    /// * `keys` - Keys on this page
    /// * `truncated` - Whether more keys remain
    pub fn new(keys: Vec<String>, truncated: bool) -> Self {
        let last_key: Option<String> = keys.last().cloned();
        Self {
            keys,
            truncated,
            last_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_page_derives_last_key() {
        let page = ListPage::new(vec!["a".to_string(), "b".to_string()], true);
        assert_eq!(page.last_key.as_deref(), Some("b"));
        assert!(page.truncated);
    }

    #[test]
    fn test_empty_list_page_has_no_marker() {
        let page = ListPage::new(Vec::new(), false);
        assert!(page.last_key.is_none());
    }
}
