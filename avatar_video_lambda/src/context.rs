use aws_sdk_secretsmanager::client::Client as SecretsManagerClient;
use redact::Secret;
use std::path::{Path, PathBuf};
use std::time::Duration;
use types::VideoCreation;

use crate::{
    config::Config,
    download,
    error::GenerateVideoError,
    lip_sync::{self, LipSyncError},
    metadata::{self, MetadataError},
    pipeline::Stages,
    replicate::ReplicateClient,
    speech::{self, VoiceSettings},
    storage::{self, StorageError},
};

/// Field holding the token when the secret is a JSON object.
const REPLICATE_SECRET_FIELD: &str = "api_token";

const TOKEN_NOT_FOUND: &str = "Replicate API token not found.";

#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub s3: aws_sdk_s3::Client,
    pub polly: aws_sdk_polly::Client,
    pub dynamodb: aws_sdk_dynamodb::Client,
    pub http: reqwest::Client,
    /// `None` when no token could be resolved at startup.
    pub replicate: Option<ReplicateClient>,
    pub region: String,
    pub scratch_dir: PathBuf,
    pub voice: VoiceSettings,
}

impl ta_app::ContextProvider<Config> for AppContext {
    async fn new(config: Config, aws_config: aws_config::SdkConfig) -> Self {
        let http = match reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    "failed to build HTTP client, using defaults: {}",
                    e
                );
                reqwest::Client::new()
            }
        };

        let replicate = resolve_replicate_token(&config, &aws_config)
            .await
            .map(|token| {
                ReplicateClient::new(
                    http.clone(),
                    &config.replicate_api_url,
                    token,
                    Duration::from_millis(config.replicate_poll_interval_ms),
                )
            });

        if replicate.is_none() {
            tracing::error!(
                "{} Every request will fail until it is configured.",
                TOKEN_NOT_FOUND
            );
        }

        let region = aws_config
            .region()
            .map_or_else(|| "us-east-1".to_string(), ToString::to_string);

        Self {
            s3: aws_sdk_s3::Client::new(&aws_config),
            polly: aws_sdk_polly::Client::new(&aws_config),
            dynamodb: aws_sdk_dynamodb::Client::new(&aws_config),
            http,
            replicate,
            region,
            scratch_dir: config.scratch_dir(),
            voice: VoiceSettings::default(),
            config,
        }
    }
}

/// The inline token if set, otherwise the token stored in Secrets Manager.
async fn resolve_replicate_token(
    config: &Config,
    aws_config: &aws_config::SdkConfig,
) -> Option<Secret<String>> {
    if let Some(token) = config.inline_replicate_token() {
        return Some(token.clone());
    }

    let secret_arn = config.replicate_secret_arn.as_deref()?;
    let secrets_manager = SecretsManagerClient::new(aws_config);

    match ta_secrets::get_token(
        &secrets_manager,
        secret_arn,
        REPLICATE_SECRET_FIELD,
    )
    .await
    {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::error!("failed to read Replicate secret: {}", e);
            None
        }
    }
}

impl AppContext {
    fn replicate(&self) -> Result<&ReplicateClient, GenerateVideoError> {
        self.replicate.as_ref().ok_or_else(|| {
            GenerateVideoError::Configuration(TOKEN_NOT_FOUND.to_string())
        })
    }
}

impl Stages for AppContext {
    fn ensure_configured(&self) -> Result<(), GenerateVideoError> {
        self.replicate().map(|_| ())
    }

    fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    async fn fetch_avatar(
        &self,
        key: &str,
        destination: &Path,
    ) -> Result<(), GenerateVideoError> {
        storage::download_object(
            &self.s3,
            &self.config.storage_bucket,
            key,
            destination,
        )
        .await
        .map(|_| ())
        .map_err(|e| match e {
            StorageError::NotFound { key } => {
                GenerateVideoError::AvatarNotFound { path: key }
            }
            other => GenerateVideoError::stage(format!(
                "Failed to download avatar image. Server error: {other}"
            )),
        })
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        destination: &Path,
    ) -> Result<(), GenerateVideoError> {
        speech::synthesize_to_file(&self.polly, &self.voice, text, destination)
            .await
            .map(|_| ())
            .map_err(|e| {
                GenerateVideoError::stage(format!("TTS generation failed: {e}"))
            })
    }

    async fn invoke_lip_sync(
        &self,
        image: &Path,
        audio: &Path,
    ) -> Result<String, GenerateVideoError> {
        let client = self.replicate()?;

        lip_sync::generate(client, image, audio)
            .await
            .map_err(|e| match e {
                LipSyncError::Replicate(e) => GenerateVideoError::stage(format!(
                    "Lip-sync generation failed due to Replicate API error: {e}"
                )),
                LipSyncError::Input(e) => GenerateVideoError::stage(format!(
                    "Lip-sync process failed: {e}"
                )),
                LipSyncError::MissingOutput => GenerateVideoError::stage(
                    "Lip-sync process did not return a video URL \
                     from Replicate.",
                ),
            })
    }

    async fn fetch_result(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<(), GenerateVideoError> {
        download::download_to_file(&self.http, url, destination)
            .await
            .map(|_| ())
            .map_err(|e| {
                GenerateVideoError::stage(format!(
                    "Failed to download generated video from Replicate: {e}"
                ))
            })
    }

    async fn publish_video(
        &self,
        source: &Path,
        key: &str,
    ) -> Result<String, GenerateVideoError> {
        storage::upload_object(
            &self.s3,
            &self.config.storage_bucket,
            key,
            source,
            "video/mp4",
            self.config.public_read_acl,
        )
        .await
        .map_err(|e| {
            GenerateVideoError::stage(format!(
                "Failed to upload video to storage: {e}"
            ))
        })?;

        let url = storage::public_url(
            self.config.public_url_base.as_deref(),
            &self.config.storage_bucket,
            &self.region,
            key,
        );
        tracing::info!("Video uploaded to storage: {}", url);

        Ok(url)
    }

    async fn record_metadata(
        &self,
        record: &VideoCreation,
    ) -> Result<String, MetadataError> {
        metadata::insert_video_creation(
            &self.dynamodb,
            &self.config.video_creations_table,
            record,
        )
        .await
    }
}
