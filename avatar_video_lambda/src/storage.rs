//! S3 access for avatar images and published videos.
use aws_sdk_s3::{
    error::DisplayErrorContext,
    operation::get_object::GetObjectError,
    primitives::ByteStream,
    types::ObjectCannedAcl,
};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object '{key}' not found")]
    NotFound { key: String },
    #[error("failed to get object '{key}': {detail}")]
    Get { key: String, detail: String },
    #[error("failed to put object '{key}': {detail}")]
    Put { key: String, detail: String },
    #[error("failed to read upload source: {0}")]
    Source(String),
    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stream an object to a local file.
///
/// # Returns
/// The number of bytes written.
///
/// # Errors
/// - `StorageError::NotFound` if the key does not exist in the bucket.
/// - `StorageError::Get` for any other S3 failure.
/// - `StorageError::Io` if the local file cannot be written.
pub async fn download_object(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    destination: &Path,
) -> Result<u64, StorageError> {
    let response = match client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            let not_found = e
                .as_service_error()
                .is_some_and(GetObjectError::is_no_such_key)
                || e.raw_response()
                    .is_some_and(|raw| raw.status().as_u16() == 404);

            if not_found {
                return Err(StorageError::NotFound {
                    key: key.to_string(),
                });
            }

            return Err(StorageError::Get {
                key: key.to_string(),
                detail: DisplayErrorContext(&e).to_string(),
            });
        }
    };

    let mut file = tokio::fs::File::create(destination).await?;
    let mut stream = response.body.into_async_read();
    let written = tokio::io::copy(&mut stream, &mut file).await?;

    tracing::info!(
        "Object '{}' downloaded to '{}' ({} bytes)",
        key,
        destination.display(),
        written
    );

    Ok(written)
}

/// Upload a local file.
///
/// With `public_read` the object gets the `public-read` canned ACL. Buckets
/// with ACLs disabled (object ownership `BucketOwnerEnforced`) reject that,
/// so they must be uploaded to without it and made readable by a bucket
/// policy instead.
///
/// # Errors
/// - `StorageError::Source` if the local file cannot be opened.
/// - `StorageError::Put` if S3 rejects the upload.
pub async fn upload_object(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    source: &Path,
    content_type: &str,
    public_read: bool,
) -> Result<(), StorageError> {
    let body = ByteStream::from_path(source)
        .await
        .map_err(|e| StorageError::Source(e.to_string()))?;

    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .set_acl(public_read.then_some(ObjectCannedAcl::PublicRead))
        .body(body)
        .send()
        .await
        .map_err(|e| StorageError::Put {
            key: key.to_string(),
            detail: DisplayErrorContext(&e).to_string(),
        })?;

    tracing::info!("Object uploaded to '{}/{}'", bucket, key);

    Ok(())
}

/// Public locator of an object.
///
/// Uses `public_url_base` when configured (a CDN in front of the bucket),
/// otherwise the bucket's virtual-hosted S3 URL.
#[must_use]
pub fn public_url(
    public_url_base: Option<&str>,
    bucket: &str,
    region: &str,
    key: &str,
) -> String {
    match public_url_base {
        Some(base) => format!("{}/{key}", base.trim_end_matches('/')),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
    }
}
