//! Optional archive of original uploads in S3-compatible object storage.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::S3Config;

#[async_trait]
pub trait FileArchive: Send + Sync {
    /// Stores the file and returns its key, or `None` when nothing was stored.
    /// Failures are logged here and never surface to the caller.
    async fn store(
        &self,
        user_id: Uuid,
        resume_id: Uuid,
        filename: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Option<String>;
}

pub struct NoopArchive;

#[async_trait]
impl FileArchive for NoopArchive {
    async fn store(&self, _: Uuid, _: Uuid, _: &str, _: &str, _: Bytes) -> Option<String> {
        None
    }
}

pub struct S3Archive {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Archive {
    /// Constructs a client for MinIO (local) or AWS (production).
    pub async fn connect(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "resume-api-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }
}

/// `resumes/{user}/{resume}/{filename}`, with path separators stripped from the filename.
pub fn object_key(user_id: Uuid, resume_id: Uuid, filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("resumes/{user_id}/{resume_id}/{safe}")
}

#[async_trait]
impl FileArchive for S3Archive {
    async fn store(
        &self,
        user_id: Uuid,
        resume_id: Uuid,
        filename: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Option<String> {
        let key = object_key(user_id, resume_id, filename);
        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!("Archived upload to s3://{}/{}", self.bucket, key);
                Some(key)
            }
            Err(e) => {
                warn!("S3 upload failed for resume {resume_id}: {e}");
                None
            }
        }
    }
}
