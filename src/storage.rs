use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

/// Key suffix of packaged chart archives
pub const ARCHIVE_SUFFIX: &str = ".tgz";

/// An object as returned by a prefix listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// A fetched object: its contents and user metadata
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

/// The slice of an object store the index rebuild needs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket all keys are relative to
    fn bucket(&self) -> &str;

    /// List every object whose key starts with `prefix`, in key order
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;

    async fn get_object(&self, key: &str) -> Result<StoredObject>;

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;
}

/// Keep only the chart archives from a listing
pub fn chart_archives(objects: Vec<ObjectSummary>) -> Vec<ObjectSummary> {
    objects
        .into_iter()
        .filter(|object| object.key.ends_with(ARCHIVE_SUFFIX))
        .collect()
}

/// `s3://bucket/key` location of an object
pub fn object_url(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

/// S3-backed store using a named profile from the shared AWS config
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    /// Load credentials and region for the configured profile and build a client
    pub async fn connect(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .profile_name(&config.profile);
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        // S3-compatible servers generally don't do virtual-hosted buckets
        if let Some(endpoint) = &config.endpoint_url {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }

        Self::from_client(S3Client::from_conf(s3_config.build()), config.bucket.clone())
    }

    pub fn from_client(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::storage("listing", prefix, DisplayErrorContext(e)))?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                let last_modified = object
                    .last_modified()
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
                    .ok_or_else(|| Error::storage("listing", key, "missing last-modified time"))?;
                objects.push(ObjectSummary {
                    key: key.to_string(),
                    last_modified,
                });
            }

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(bucket = %self.bucket, prefix, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::storage("fetching", key, DisplayErrorContext(e)))?;

        let metadata = response.metadata().cloned().unwrap_or_default();
        let body = response
            .body
            .collect()
            .await
            .map_err(|e| Error::storage("reading", key, e))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject { body, metadata })
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| Error::storage("uploading", key, DisplayErrorContext(e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(key: &str) -> ObjectSummary {
        ObjectSummary {
            key: key.to_string(),
            last_modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_chart_archives_filters_by_suffix() {
        let objects = vec![
            summary("charts/index.yaml"),
            summary("charts/foo-1.0.0.tgz"),
            summary("charts/foo-1.0.0.tgz.prov"),
            summary("charts/bar-0.1.0.tar.gz"),
            summary("charts/bar-0.2.0.tgz"),
        ];

        let keys: Vec<String> = chart_archives(objects).into_iter().map(|o| o.key).collect();

        assert_eq!(keys, ["charts/foo-1.0.0.tgz", "charts/bar-0.2.0.tgz"]);
    }

    #[test]
    fn test_object_url() {
        assert_eq!(
            object_url("charts-bucket", "charts/foo-1.0.0.tgz"),
            "s3://charts-bucket/charts/foo-1.0.0.tgz"
        );
    }
}
