use aws_sdk_polly::{
    error::DisplayErrorContext,
    types::{Engine, LanguageCode, OutputFormat, VoiceId},
};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("{0}")]
    Synthesize(String),
    #[error("failed to save audio: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed voice: US English, standard-engine female voice, MP3 output.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub language_code: LanguageCode,
    pub voice_id: VoiceId,
    pub engine: Engine,
    pub output_format: OutputFormat,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            language_code: LanguageCode::EnUs,
            voice_id: VoiceId::Joanna,
            engine: Engine::Standard,
            output_format: OutputFormat::Mp3,
        }
    }
}

/// Synthesize `text` with Amazon Polly and write the audio to `destination`.
///
/// # Returns
/// The number of audio bytes written.
///
/// # Errors
/// - `SpeechError::Synthesize` if Polly rejects the request.
/// - `SpeechError::Io` if the audio cannot be streamed to disk.
pub async fn synthesize_to_file(
    client: &aws_sdk_polly::Client,
    voice: &VoiceSettings,
    text: &str,
    destination: &Path,
) -> Result<u64, SpeechError> {
    let output = client
        .synthesize_speech()
        .text(text)
        .language_code(voice.language_code.clone())
        .voice_id(voice.voice_id.clone())
        .engine(voice.engine.clone())
        .output_format(voice.output_format.clone())
        .send()
        .await
        .map_err(|e| {
            SpeechError::Synthesize(DisplayErrorContext(&e).to_string())
        })?;

    let mut file = tokio::fs::File::create(destination).await?;
    let mut audio = output.audio_stream.into_async_read();
    let written = tokio::io::copy(&mut audio, &mut file).await?;

    tracing::info!(
        "Audio content written to file \"{}\" ({} bytes)",
        destination.display(),
        written
    );

    Ok(written)
}
