//! S3 implementation of the datastore trait.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use blockstore_datastore::{Datastore, DatastoreError, ListPage};

use crate::settings::S3Settings;

/// Datastore implementation backed by an S3 bucket.
///
/// Datastore keys map to object keys as `{root_prefix}{key}` with the key's
/// leading `/` trimmed. Listing pages come straight from `ListObjectsV2`;
/// the resume marker is passed as `start_after`.
pub struct S3Datastore {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Bucket name.
    bucket: String,
    /// Prefix inside the bucket under which all keys live.
    root_prefix: String,
    /// Expected bucket owner for security validation.
    expected_bucket_owner: Option<String>,
}

impl S3Datastore {
    /// Create a new S3 datastore with the default credential chain.
    ///
    /// # Arguments
    /// * `settings` - Region, bucket, root prefix and optional credentials
    ///
    /// # Returns
    /// A new S3 datastore.
    pub async fn new(settings: S3Settings) -> Result<Self, DatastoreError> {
        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "blockstore-datastore",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let sdk_config = config_loader.load().await;
        let s3_client = S3Client::new(&sdk_config);

        Ok(Self {
            s3_client,
            bucket: settings.bucket,
            root_prefix: settings.root_prefix,
            expected_bucket_owner: settings.expected_bucket_owner,
        })
    }

    /// Create a datastore from an existing S3 client (for testing).
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket` - Bucket name
    /// * `root_prefix` - Prefix inside the bucket for all keys
    pub fn from_client(
        s3_client: S3Client,
        bucket: impl Into<String>,
        root_prefix: impl Into<String>,
    ) -> Self {
        Self {
            s3_client,
            bucket: bucket.into(),
            root_prefix: root_prefix.into(),
            expected_bucket_owner: None,
        }
    }

    /// Map a datastore key to its object key in the bucket.
    fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.root_prefix, key.trim_start_matches('/'))
    }

    /// Map an object key back to its datastore key.
    fn datastore_key(&self, object_key: &str) -> String {
        let suffix: &str = object_key
            .strip_prefix(&self.root_prefix)
            .unwrap_or(object_key);
        format!("/{}", suffix.trim_start_matches('/'))
    }
}

#[async_trait]
impl Datastore for S3Datastore {
    async fn open(&self) -> Result<(), DatastoreError> {
        let mut request = self.s3_client.head_bucket().bucket(&self.bucket);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Err(DatastoreError::InvalidConfig {
                        message: format!("bucket {} does not exist", self.bucket),
                    })
                } else {
                    Err(DatastoreError::Network {
                        message: service_err.to_string(),
                        retryable: false,
                    })
                }
            }
        }
    }

    async fn close(&self) -> Result<(), DatastoreError> {
        Ok(())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), DatastoreError> {
        let body = ByteStream::from(value.to_vec());

        let mut request = self
            .s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .body(body);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        request
            .send()
            .await
            .map_err(|err| DatastoreError::Network {
                message: err.to_string(),
                retryable: true,
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, DatastoreError> {
        let mut request = self
            .s3_client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(key));

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        let response = request.send().await.map_err(|err| {
            let service_err = err.into_service_error();
            if service_err.is_no_such_key() {
                DatastoreError::NotFound {
                    key: key.to_string(),
                }
            } else {
                DatastoreError::Network {
                    message: service_err.to_string(),
                    retryable: true,
                }
            }
        })?;

        let data: Vec<u8> = response
            .body
            .collect()
            .await
            .map_err(|e| DatastoreError::Network {
                message: e.to_string(),
                retryable: true,
            })?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn has(&self, key: &str) -> Result<bool, DatastoreError> {
        let mut request = self
            .s3_client
            .head_object()
            .bucket(&self.bucket)
            .key(self.object_key(key));

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        match request.send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(DatastoreError::Network {
                        message: service_err.to_string(),
                        retryable: false,
                    })
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), DatastoreError> {
        let mut request = self
            .s3_client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.object_key(key));

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        request
            .send()
            .await
            .map_err(|err| DatastoreError::Network {
                message: err.to_string(),
                retryable: true,
            })?;

        Ok(())
    }

    async fn list_page(
        &self,
        prefix: &str,
        resume_after: Option<&str>,
    ) -> Result<ListPage, DatastoreError> {
        let mut request = self
            .s3_client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(self.object_key(prefix));

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        if let Some(marker) = resume_after {
            request = request.start_after(self.object_key(marker));
        }

        let response = request
            .send()
            .await
            .map_err(|err| DatastoreError::Network {
                message: err.to_string(),
                retryable: true,
            })?;

        let mut keys: Vec<String> = Vec::new();
        if let Some(ref contents) = response.contents {
            for obj in contents {
                keys.push(self.datastore_key(obj.key().unwrap_or_default()));
            }
        }

        let truncated: bool = response.is_truncated() == Some(true);
        Ok(ListPage::new(keys, truncated))
    }

    async fn query(&self, prefix: &str) -> Result<Vec<String>, DatastoreError> {
        let mut keys: Vec<String> = Vec::new();
        let mut resume_after: Option<String> = None;

        loop {
            let page: ListPage = self.list_page(prefix, resume_after.as_deref()).await?;
            keys.extend(page.keys);
            if !page.truncated {
                break;
            }
            match page.last_key {
                Some(marker) => resume_after = Some(marker),
                None => break,
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::Config;

    fn test_store() -> S3Datastore {
        let config = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        S3Datastore::from_client(S3Client::from_conf(config), "test-bucket", "repo/")
    }

    #[test]
    fn test_s3_datastore_implements_datastore() {
        fn assert_datastore<T: Datastore>() {}
        assert_datastore::<S3Datastore>();
    }

    #[test]
    fn test_object_key_mapping() {
        let store = test_store();
        assert_eq!(store.object_key("/blocks/abc123"), "repo/blocks/abc123");
        assert_eq!(store.object_key("blocks/abc123"), "repo/blocks/abc123");
    }

    #[test]
    fn test_datastore_key_mapping_round_trips() {
        let store = test_store();
        let object_key: String = store.object_key("/blocks/abc123");
        assert_eq!(store.datastore_key(&object_key), "/blocks/abc123");
    }

    #[test]
    fn test_datastore_key_for_foreign_object_key() {
        let store = test_store();
        assert_eq!(store.datastore_key("other/abc"), "/other/abc");
    }
}
