//! AWS SDK S3 backend for the blockstore datastore.
//!
//! This crate provides a `Datastore` implementation backed by an S3 bucket.
//! Keys map to object keys under a configurable root prefix, and the
//! paginated listing primitive maps to `ListObjectsV2` with `start_after`
//! as the resume marker.
//!
//! # Example
//!
//! ```ignore
//! use blockstore_datastore::CachedDatastore;
//! use blockstore_datastore_s3::{S3Datastore, S3Settings};
//!
//! let settings = S3Settings::new("us-west-2", "my-bucket", "repo/");
//! let store = S3Datastore::new(settings).await?;
//! let store = CachedDatastore::new(store, "/blocks/");
//! ```

mod client;
mod settings;

pub use client::S3Datastore;
pub use settings::{AwsCredentials, S3Settings};
