use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    routing::any,
};
use std::sync::Arc;
use ta_axum::execution_id::ExecutionId;
use types::GenerateVideoResponse;

use crate::{
    artifacts::TransientArtifacts,
    error::GenerateVideoError,
    pipeline::{self, PipelineStage, Stages},
    request::parse_request,
};

pub const SUCCESS_MESSAGE: &str = "Video generated successfully!";

/// Build the service router around shared stage collaborators.
pub fn router<S: Stages>(stages: Arc<S>) -> Router {
    let app = Router::new()
        .route("/", any(generate_video_handler::<S>))
        .route("/generate-avatar-video", any(generate_video_handler::<S>))
        .with_state(stages);

    ta_axum::with_default_layers(app)
}

async fn generate_video_handler<S: Stages>(
    State(stages): State<Arc<S>>,
    execution_id: ExecutionId,
    body: Bytes,
) -> Response {
    match generate_video(stages, execution_id, body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Validate the request and run the pipeline to completion.
///
/// The pipeline runs on its own task, so it finishes even if the caller
/// goes away and a panic inside it surfaces as
/// [`GenerateVideoError::Unexpected`]. Transient files are removed when the
/// task ends, however it ends.
///
/// # Errors
/// The first failure encountered, see [`GenerateVideoError`].
pub async fn generate_video<S: Stages>(
    stages: Arc<S>,
    execution_id: ExecutionId,
    body: Bytes,
) -> Result<GenerateVideoResponse, GenerateVideoError> {
    stages.ensure_configured().inspect_err(|e| {
        tracing::error!(execution_id = %execution_id, "{}", e);
    })?;

    tracing::info!(
        execution_id = %execution_id,
        stage = %PipelineStage::Validating,
        "stage started"
    );
    let request = parse_request(&body).inspect_err(|e| {
        tracing::warn!(execution_id = %execution_id, "{}", e);
    })?;

    tracing::info!(
        execution_id = %execution_id,
        user_id = %request.user_id,
        avatar_id = %request.avatar_id,
        "Received request"
    );

    let artifacts =
        TransientArtifacts::new(stages.scratch_dir(), execution_id.as_str());

    let task = tokio::spawn(async move {
        pipeline::run(stages.as_ref(), &request, &artifacts).await
    });

    let video_url = match task.await {
        Ok(result) => result?,
        Err(e) => {
            tracing::error!(
                execution_id = %execution_id,
                "pipeline task failed: {}",
                e
            );
            return Err(GenerateVideoError::Unexpected);
        }
    };

    Ok(GenerateVideoResponse {
        message: SUCCESS_MESSAGE.to_string(),
        video_url,
    })
}
