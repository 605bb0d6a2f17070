//! Object storage client
//!
//! Stores model artifacts in S3:
//! - Existence checks before upload
//! - Single-request and multipart uploads
//! - Paginated listing and batched deletion

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, Delete, ObjectIdentifier};
use aws_smithy_types::byte_stream::Length;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Files above this size are uploaded in parts of this size
const MULTIPART_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Object storage operations needed by the model lifecycle
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Checks whether an object exists
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Uploads a local file to `bucket/key`
    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;

    /// Lists every key under a prefix, following pagination
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Deletes a batch of keys in a single request
    ///
    /// Callers are responsible for keeping batches within the service limit.
    async fn delete_keys(&self, bucket: &str, keys: &[String]) -> Result<()>;
}

/// S3 implementation of [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(std::io::Error::other)?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| ClientError::aws("PutObject", e))?;

        Ok(())
    }

    async fn multipart_upload(&self, bucket: &str, key: &str, path: &Path, size: u64) -> Result<()> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ClientError::aws("CreateMultipartUpload", e))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| ClientError::ParseError("CreateMultipartUpload returned no upload id".into()))?
            .to_string();

        let parts = match self.upload_parts(bucket, key, path, size, &upload_id).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort_multipart(bucket, key, &upload_id).await;
                return Err(e);
            }
        };

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        if let Err(e) = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
        {
            self.abort_multipart(bucket, key, &upload_id).await;
            return Err(ClientError::aws("CompleteMultipartUpload", e));
        }

        Ok(())
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        size: u64,
        upload_id: &str,
    ) -> Result<Vec<CompletedPart>> {
        let mut parts = Vec::new();
        let mut offset = 0u64;
        let mut part_number = 1i32;

        while offset < size {
            let length = MULTIPART_PART_SIZE.min(size - offset);
            let body = ByteStream::read_from()
                .path(path)
                .offset(offset)
                .length(Length::Exact(length))
                .build()
                .await
                .map_err(std::io::Error::other)?;

            let output = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(body)
                .send()
                .await
                .map_err(|e| ClientError::aws("UploadPart", e))?;

            debug!("Uploaded part {} of {} ({} bytes)", part_number, key, length);

            parts.push(
                CompletedPart::builder()
                    .set_e_tag(output.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );

            offset += length;
            part_number += 1;
        }

        Ok(parts)
    }

    async fn abort_multipart(&self, bucket: &str, key: &str, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            warn!(
                "Failed to abort multipart upload {} for {}: {}",
                upload_id,
                key,
                ClientError::aws("AbortMultipartUpload", e)
            );
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(ClientError::aws("HeadObject", e)),
        }
    }

    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let size = tokio::fs::metadata(path).await?.len();

        if size > MULTIPART_PART_SIZE {
            self.multipart_upload(bucket, key, path, size).await
        } else {
            self.put_file(bucket, key, path).await
        }
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| ClientError::aws("ListObjectsV2", e))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }

        Ok(keys)
    }

    async fn delete_keys(&self, bucket: &str, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| ClientError::aws("DeleteObjects", e))?;

        let errors = output.errors();
        if !errors.is_empty() {
            let first = &errors[0];
            return Err(ClientError::Aws {
                operation: "DeleteObjects",
                message: format!(
                    "{} key(s) not deleted, first {}: {}",
                    errors.len(),
                    first.key().unwrap_or("<unknown>"),
                    first.message().unwrap_or("no message")
                ),
            });
        }

        Ok(())
    }
}
