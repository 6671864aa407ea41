// Wire and record types shared by the Talking Avatar services.
//
// use types::GenerateVideoResponse;
//
// fn main() {
//     let json = r#"{"message": "ok", "video_url": "https://a.io/v.mp4"}"#;
//     let model: GenerateVideoResponse = serde_json::from_str(&json).unwrap();
// }

use serde::{Deserialize, Serialize};

/// User id recorded when a request does not name one.
pub const DEFAULT_USER_ID: &str = "test_user";

/// A validated request to generate a talking-avatar video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateVideoRequest {
    pub script_text: String,

    pub avatar_id: String,

    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateVideoResponse {
    pub message: String,

    pub video_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCreationStatus {
    Completed,
}

/// Metadata stored for every published video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCreation {
    pub id: String,

    pub user_id: String,

    pub video_url: String,

    pub script_text: String,

    pub avatar_id: String,

    /// RFC 3339, UTC.
    pub created_at: String,

    pub status: VideoCreationStatus,
}
