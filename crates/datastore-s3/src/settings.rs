//! Settings for the S3 datastore backend.

/// Explicit AWS credentials. When absent, the default credential chain
/// (environment, profile, instance metadata) is used.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Settings for connecting an [`S3Datastore`](crate::S3Datastore) to a
/// bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// AWS region.
    pub region: String,
    /// Bucket name.
    pub bucket: String,
    /// Prefix inside the bucket under which all datastore keys live.
    pub root_prefix: String,
    /// Optional explicit credentials.
    pub credentials: Option<AwsCredentials>,
    /// Expected bucket owner account ID for cross-account safety.
    pub expected_bucket_owner: Option<String>,
}

impl S3Settings {
    /// Create settings with the default credential chain.
    ///
    /// # Arguments
    /// * `region` - AWS region
    /// * `bucket` - Bucket name
    /// * `root_prefix` - Prefix inside the bucket for all keys
    pub fn new(
        region: impl Into<String>,
        bucket: impl Into<String>,
        root_prefix: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            bucket: bucket.into(),
            root_prefix: root_prefix.into(),
            credentials: None,
            expected_bucket_owner: None,
        }
    }

    /// Set explicit credentials.
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the expected bucket owner account ID.
    pub fn with_expected_bucket_owner(mut self, owner: impl Into<String>) -> Self {
        self.expected_bucket_owner = Some(owner.into());
        self
    }
}
