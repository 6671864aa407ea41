//! The six-stage video generation pipeline.
//!
//! Stages run strictly in order against a [`Stages`] implementation. The
//! first failing stage ends the run; metadata recording is the only stage
//! whose failure is tolerated.
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use types::{GenerateVideoRequest, VideoCreation};

use crate::{
    artifacts::TransientArtifacts, error::GenerateVideoError,
    metadata::{self, MetadataError},
};

/// The collaborators the pipeline drives, one method per stage.
///
/// Each method maps its own failures into the caller-facing
/// [`GenerateVideoError`], except `record_metadata` whose failure is only
/// ever logged.
pub trait Stages: Send + Sync + 'static {
    /// Checked before the request is even validated.
    fn ensure_configured(&self) -> Result<(), GenerateVideoError> {
        Ok(())
    }

    /// Directory holding the transient artifacts of every invocation.
    fn scratch_dir(&self) -> &Path;

    fn fetch_avatar(
        &self,
        key: &str,
        destination: &Path,
    ) -> impl Future<Output = Result<(), GenerateVideoError>> + Send;

    fn synthesize_speech(
        &self,
        text: &str,
        destination: &Path,
    ) -> impl Future<Output = Result<(), GenerateVideoError>> + Send;

    /// Returns the URL of the generated video.
    fn invoke_lip_sync(
        &self,
        image: &Path,
        audio: &Path,
    ) -> impl Future<Output = Result<String, GenerateVideoError>> + Send;

    fn fetch_result(
        &self,
        url: &str,
        destination: &Path,
    ) -> impl Future<Output = Result<(), GenerateVideoError>> + Send;

    /// Returns the public URL of the published video.
    fn publish_video(
        &self,
        source: &Path,
        key: &str,
    ) -> impl Future<Output = Result<String, GenerateVideoError>> + Send;

    /// Returns the stored document id.
    fn record_metadata(
        &self,
        record: &VideoCreation,
    ) -> impl Future<Output = Result<String, MetadataError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    FetchingImage,
    SynthesizingAudio,
    InvokingLipSync,
    FetchingResult,
    Publishing,
    RecordingMetadata,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::FetchingImage => "fetching_image",
            Self::SynthesizingAudio => "synthesizing_audio",
            Self::InvokingLipSync => "invoking_lip_sync",
            Self::FetchingResult => "fetching_result",
            Self::Publishing => "publishing",
            Self::RecordingMetadata => "recording_metadata",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Run every stage for `request`, writing intermediate files to
/// `artifacts`.
///
/// # Returns
/// The public URL of the published video.
///
/// # Errors
/// The error of the first stage that fails. Metadata failures are logged
/// and do not fail the run.
pub async fn run<S: Stages>(
    stages: &S,
    request: &GenerateVideoRequest,
    artifacts: &TransientArtifacts,
) -> Result<String, GenerateVideoError> {
    let avatar_key = avatar_storage_key(&request.avatar_id);
    step(
        PipelineStage::FetchingImage,
        stages.fetch_avatar(&avatar_key, artifacts.avatar()),
    )
    .await?;

    step(
        PipelineStage::SynthesizingAudio,
        stages.synthesize_speech(&request.script_text, artifacts.audio()),
    )
    .await?;

    let result_url = step(
        PipelineStage::InvokingLipSync,
        stages.invoke_lip_sync(artifacts.avatar(), artifacts.audio()),
    )
    .await?;

    step(
        PipelineStage::FetchingResult,
        stages.fetch_result(&result_url, artifacts.video()),
    )
    .await?;

    let destination =
        destination_key(&request.user_id, &request.avatar_id, Utc::now());
    let video_url = step(
        PipelineStage::Publishing,
        stages.publish_video(artifacts.video(), &destination),
    )
    .await?;

    tracing::info!(stage = %PipelineStage::RecordingMetadata, "stage started");
    let record = metadata::new_record(request, &video_url);
    match stages.record_metadata(&record).await {
        Ok(document_id) => {
            tracing::info!(
                stage = %PipelineStage::RecordingMetadata,
                document_id = %document_id,
                "stage completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                stage = %PipelineStage::RecordingMetadata,
                "Could not save metadata: {}",
                e
            );
        }
    }

    tracing::info!(
        stage = %PipelineStage::Done,
        video_url = %video_url,
        "pipeline finished"
    );

    Ok(video_url)
}

async fn step<T>(
    stage: PipelineStage,
    future: impl Future<Output = Result<T, GenerateVideoError>>,
) -> Result<T, GenerateVideoError> {
    tracing::info!(stage = %stage, "stage started");

    let result = future.await.inspect_err(|e| {
        tracing::error!(
            stage = %PipelineStage::Failed,
            failed_stage = %stage,
            "{}",
            e
        );
    });

    if result.is_ok() {
        tracing::info!(stage = %stage, "stage completed");
    }

    result
}

#[must_use]
pub fn avatar_storage_key(avatar_id: &str) -> String {
    format!("avatars/default/{avatar_id}")
}

/// `avatar_id` up to its first `.`.
#[must_use]
pub fn avatar_base_name(avatar_id: &str) -> &str {
    avatar_id
        .split_once('.')
        .map_or(avatar_id, |(base, _)| base)
}

/// Storage key of a published video. Two uploads for the same user and
/// avatar within one second share a key.
#[must_use]
pub fn destination_key(
    user_id: &str,
    avatar_id: &str,
    now: DateTime<Utc>,
) -> String {
    format!(
        "generated_videos/{user_id}/{}_{}.mp4",
        now.format("%Y%m%d_%H%M%S"),
        avatar_base_name(avatar_id)
    )
}
