use aws_sdk_dynamodb::{error::DisplayErrorContext, types::AttributeValue};
use std::collections::HashMap;
use thiserror::Error;
use types::{GenerateVideoRequest, VideoCreation, VideoCreationStatus};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_dynamo::Error),
    #[error("failed to store record: {0}")]
    PutItem(String),
}

/// Build the record for a freshly published video.
#[must_use]
pub fn new_record(
    request: &GenerateVideoRequest,
    video_url: &str,
) -> VideoCreation {
    VideoCreation {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: request.user_id.clone(),
        video_url: video_url.to_string(),
        script_text: request.script_text.clone(),
        avatar_id: request.avatar_id.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
        status: VideoCreationStatus::Completed,
    }
}

/// Store `record` in the video creations table.
///
/// # Returns
/// The id of the stored record.
///
/// # Errors
/// - `MetadataError::Serialize` if the record cannot be converted to an item.
/// - `MetadataError::PutItem` if DynamoDB rejects the write.
pub async fn insert_video_creation(
    client: &aws_sdk_dynamodb::Client,
    table_name: &str,
    record: &VideoCreation,
) -> Result<String, MetadataError> {
    let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(record)?;

    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(item))
        .send()
        .await
        .map_err(|e| {
            MetadataError::PutItem(DisplayErrorContext(&e).to_string())
        })?;

    tracing::info!(
        "Video metadata saved to {} with ID: {}",
        table_name,
        record.id
    );

    Ok(record.id.clone())
}
