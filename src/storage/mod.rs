//! Object storage for uploaded images

mod image;

pub use image::{reencode, validate_extension, ImageKind};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

use crate::config::StorageConfig;
use crate::errors::AppError;

/// Stores a blob under a key and returns its publicly resolvable URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AppError>;
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    pub async fn new(config: &StorageConfig) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&aws_config),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("put_object failed: {}", e)))?;

        Ok(format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        ))
    }
}
