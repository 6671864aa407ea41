use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use std::path::Path;
use thiserror::Error;

use crate::replicate::{ReplicateClient, ReplicateError, output_url};

/// SadTalker, pinned to the version the avatar videos are generated with.
pub const SADTALKER_MODEL: &str = "cjwb/sadtalker:\
    3aa2daf61579702c6ba2411452269943457be29cc01be511252541925a0c090d";

#[derive(Error, Debug)]
pub enum LipSyncError {
    #[error(transparent)]
    Replicate(#[from] ReplicateError),
    #[error("failed to read input file: {0}")]
    Input(#[from] std::io::Error),
    #[error("lip-sync model returned no video URL")]
    MissingOutput,
}

/// Inputs up to this size travel inline as `data:` URIs; larger ones are
/// uploaded with the Files API first.
pub const INLINE_INPUT_LIMIT: usize = 256 * 1024;

/// Build the SadTalker input from the local avatar image and audio track.
///
/// # Errors
/// - `LipSyncError::Input` if either file cannot be read.
/// - `LipSyncError::Replicate` if uploading a large file fails.
pub async fn build_input(
    client: &ReplicateClient,
    image: &Path,
    audio: &Path,
) -> Result<Value, LipSyncError> {
    let image = tokio::fs::read(image).await?;
    let audio = tokio::fs::read(audio).await?;

    let source_image =
        file_input(client, image, "avatar.png", "image/png").await?;
    let driven_audio =
        file_input(client, audio, "audio.mp3", "audio/mpeg").await?;

    Ok(json!({
        "source_image": source_image,
        "driven_audio": driven_audio,
        "preprocess": "full",
        "still_mode": true,
        "enhancer": "gfpgan",
    }))
}

async fn file_input(
    client: &ReplicateClient,
    content: Vec<u8>,
    file_name: &str,
    mime: &str,
) -> Result<String, ReplicateError> {
    if content.len() <= INLINE_INPUT_LIMIT {
        return Ok(data_uri(mime, &content));
    }

    tracing::info!(
        "Input {} is {} bytes, uploading it to Replicate",
        file_name,
        content.len()
    );
    client.upload_file(content, file_name, mime).await
}

/// Animate `image` to speak `audio` and return the URL of the result video.
///
/// # Errors
/// - `LipSyncError::Input` if the local files cannot be read.
/// - `LipSyncError::Replicate` if the model run fails.
/// - `LipSyncError::MissingOutput` if the run succeeds without a video URL.
pub async fn generate(
    client: &ReplicateClient,
    image: &Path,
    audio: &Path,
) -> Result<String, LipSyncError> {
    tracing::info!(
        "Starting lip-sync process with avatar '{}' and audio '{}'",
        image.display(),
        audio.display()
    );

    let input = build_input(client, image, audio).await?;
    let output = client.run(SADTALKER_MODEL, input).await?;

    let video_url =
        output_url(output.as_ref()).ok_or(LipSyncError::MissingOutput)?;

    tracing::info!("Replicate generated video URL: {}", video_url);

    Ok(video_url)
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockResponse, MockServer};
    use redact::Secret;
    use std::time::Duration;

    fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let image = dir.join("avatar.png");
        let audio = dir.join("output.mp3");
        std::fs::write(&image, b"png").unwrap();
        std::fs::write(&audio, b"mp3").unwrap();
        (image, audio)
    }

    fn client_for(server: &MockServer) -> ReplicateClient {
        ReplicateClient::new(
            reqwest::Client::new(),
            &server.url(),
            Secret::new("r8_test".to_string()),
            Duration::from_millis(5),
        )
    }

    #[tokio::test]
    async fn test_build_input_fixed_parameters() {
        let server = MockServer::start(Vec::new()).await;
        let scratch = tempfile::tempdir().unwrap();
        let (image, audio) = write_inputs(scratch.path());

        let input = build_input(&client_for(&server), &image, &audio)
            .await
            .unwrap();

        assert_eq!(input["source_image"], "data:image/png;base64,cG5n");
        assert_eq!(input["driven_audio"], "data:audio/mpeg;base64,bXAz");
        assert_eq!(input["preprocess"], "full");
        assert_eq!(input["still_mode"], true);
        assert_eq!(input["enhancer"], "gfpgan");
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_build_input_uploads_large_files() {
        let server = MockServer::start(vec![MockResponse::json(
            201,
            &json!({
                "id": "f1",
                "urls": {"get": "https://api.replicate.com/v1/files/f1"}
            }),
        )])
        .await;
        let scratch = tempfile::tempdir().unwrap();
        let (image, audio) = write_inputs(scratch.path());
        std::fs::write(&audio, vec![0_u8; INLINE_INPUT_LIMIT + 1]).unwrap();

        let input = build_input(&client_for(&server), &image, &audio)
            .await
            .unwrap();

        assert_eq!(input["source_image"], "data:image/png;base64,cG5n");
        assert_eq!(
            input["driven_audio"],
            "https://api.replicate.com/v1/files/f1"
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/files");
    }

    #[tokio::test]
    async fn test_build_input_upload_failure() {
        let server = MockServer::start(vec![MockResponse::json(
            413,
            &json!({"detail": "File too large."}),
        )])
        .await;
        let scratch = tempfile::tempdir().unwrap();
        let (image, audio) = write_inputs(scratch.path());
        std::fs::write(&image, vec![0_u8; INLINE_INPUT_LIMIT + 1]).unwrap();

        let err = build_input(&client_for(&server), &image, &audio)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LipSyncError::Replicate(ReplicateError::Api { status: 413, .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_returns_video_url() {
        let server = MockServer::start(vec![MockResponse::json(
            201,
            &json!({
                "id": "p1",
                "status": "succeeded",
                "output": "https://replicate.delivery/p1.mp4"
            }),
        )])
        .await;
        let scratch = tempfile::tempdir().unwrap();
        let (image, audio) = write_inputs(scratch.path());

        let url = generate(&client_for(&server), &image, &audio)
            .await
            .unwrap();

        assert_eq!(url, "https://replicate.delivery/p1.mp4");
    }

    #[tokio::test]
    async fn test_generate_without_output() {
        let server = MockServer::start(vec![MockResponse::json(
            201,
            &json!({"id": "p1", "status": "succeeded", "output": null}),
        )])
        .await;
        let scratch = tempfile::tempdir().unwrap();
        let (image, audio) = write_inputs(scratch.path());

        let err = generate(&client_for(&server), &image, &audio)
            .await
            .unwrap_err();

        assert!(matches!(err, LipSyncError::MissingOutput));
    }

    #[tokio::test]
    async fn test_generate_missing_input_file() {
        let server = MockServer::start(Vec::new()).await;
        let scratch = tempfile::tempdir().unwrap();

        let err = generate(
            &client_for(&server),
            &scratch.path().join("missing.png"),
            &scratch.path().join("missing.mp3"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LipSyncError::Input(_)));
        assert!(server.requests().is_empty());
    }
}
