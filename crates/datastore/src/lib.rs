//! Datastore abstraction for object-store-backed key/value storage.
//!
//! This crate provides a backend-agnostic datastore interface plus an
//! in-memory existence index for content-addressed block namespaces:
//!
//! - **Datastore trait** - The capability interface backends implement
//!   (put/get/has/delete plus the paginated listing primitive)
//! - **Existence Cache** - A wrapper datastore that answers `has` from an
//!   in-memory key set once a bulk listing of the namespace has completed,
//!   avoiding one remote round trip per membership check
//!
//! # Caching
//!
//! Content-addressed block stores check existence before every write, so a
//! cold store can issue thousands of remote HEAD-equivalent requests per
//! second. The existence cache front-loads that cost into a single paginated
//! listing of the namespace and then serves membership checks from memory,
//! staying consistent with puts and deletes routed through the wrapper.
//! Until the listing completes, checks fall through to the backend.

mod error;
pub mod existence_cache;
mod traits;
mod types;

pub use error::DatastoreError;
pub use existence_cache::{is_cached_namespace, CachedDatastore};
pub use traits::Datastore;
pub use types::ListPage;
