use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Every way a video generation request can fail, as reported to the caller.
#[derive(Error, Debug)]
pub enum GenerateVideoError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Avatar image not found at '{path}'.")]
    AvatarNotFound { path: String },
    #[error("{0}")]
    StageFailed(String),
    #[error("An unexpected server error occurred.")]
    Unexpected,
}

impl GenerateVideoError {
    pub fn stage(message: impl Into<String>) -> Self {
        Self::StageFailed(message.into())
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::AvatarNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Configuration(_)
            | Self::StageFailed(_)
            | Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GenerateVideoError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
