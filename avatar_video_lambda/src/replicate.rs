//! Minimal client for the Replicate predictions API.
//!
//! `run` mirrors the official clients: create a prediction, let the API hold
//! the connection open with `Prefer: wait`, and if the prediction is still
//! running afterwards keep re-reading it until it reaches a terminal status.
use redact::Secret;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplicateError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ReplicateError status: {status}, detail: {detail}")]
    Api { status: u16, detail: String },
    #[error("prediction {id} {status}: {detail}")]
    PredictionFailed {
        id: String,
        status: String,
        detail: String,
    },
    #[error("prediction {0} has no polling URL")]
    MissingPollUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    /// Only `starting` and `processing` are worth polling again; a status
    /// this client does not know ends the wait.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Starting | Self::Processing)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Aborted => "aborted",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionUrls {
    pub get: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUrls {
    pub get: String,
}

/// A file stored with the Files API, referenced in model inputs by
/// `urls.get`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub urls: FileUrls,
}

#[derive(Debug, Clone)]
pub struct ReplicateClient {
    http: reqwest::Client,
    api_url: String,
    api_token: Secret<String>,
    poll_interval: Duration,
}

impl ReplicateClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        api_url: &str,
        api_token: Secret<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
            poll_interval,
        }
    }

    /// Run a model to completion and return its output.
    ///
    /// `model` is either `owner/name:version` or a bare version id.
    ///
    /// # Errors
    /// - `ReplicateError::Api` for non-success HTTP responses.
    /// - `ReplicateError::PredictionFailed` if the prediction ends in any
    ///   status other than `succeeded`.
    /// - `ReplicateError::Http` for transport or decoding failures.
    pub async fn run(
        &self,
        model: &str,
        input: Value,
    ) -> Result<Option<Value>, ReplicateError> {
        let prediction = self.create_prediction(model, input).await?;
        tracing::info!(
            "Replicate prediction {} created with status {}",
            prediction.id,
            prediction.status.as_str()
        );

        let prediction = self.wait(prediction).await?;

        if prediction.status == PredictionStatus::Succeeded {
            return Ok(prediction.output);
        }

        Err(ReplicateError::PredictionFailed {
            detail: prediction
                .error
                .as_ref()
                .map_or_else(|| "no error detail".to_string(), describe),
            status: prediction.status.as_str().to_string(),
            id: prediction.id,
        })
    }

    /// Store `content` with the Files API for use as a model input.
    ///
    /// # Returns
    /// The URL to pass in place of the file.
    ///
    /// # Errors
    /// - `ReplicateError::Api` for non-success HTTP responses.
    /// - `ReplicateError::Http` for transport or decoding failures.
    pub async fn upload_file(
        &self,
        content: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, ReplicateError> {
        let part = reqwest::multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("content", part);

        let response = self
            .http
            .post(format!("{}/files", self.api_url))
            .bearer_auth(self.api_token.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let file: UploadedFile = parse_response(response).await?;
        tracing::info!(
            "Uploaded {} to Replicate as file {}",
            file_name,
            file.id
        );

        Ok(file.urls.get)
    }

    async fn create_prediction(
        &self,
        model: &str,
        input: Value,
    ) -> Result<Prediction, ReplicateError> {
        let response = self
            .http
            .post(format!("{}/predictions", self.api_url))
            .bearer_auth(self.api_token.expose_secret())
            .header("Prefer", "wait")
            .json(&json!({
                "version": version_of(model),
                "input": input,
            }))
            .send()
            .await?;

        parse_response(response).await
    }

    async fn wait(
        &self,
        mut prediction: Prediction,
    ) -> Result<Prediction, ReplicateError> {
        while !prediction.status.is_terminal() {
            let poll_url = prediction
                .urls
                .as_ref()
                .and_then(|urls| urls.get.clone())
                .ok_or_else(|| {
                    ReplicateError::MissingPollUrl(prediction.id.clone())
                })?;

            tokio::time::sleep(self.poll_interval).await;

            tracing::debug!(
                "Polling Replicate prediction {} ({})",
                prediction.id,
                prediction.status.as_str()
            );

            let response = self
                .http
                .get(poll_url)
                .bearer_auth(self.api_token.expose_secret())
                .send()
                .await?;

            prediction = parse_response(response).await?;
        }

        Ok(prediction)
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ReplicateError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| {
                value.get("detail").and_then(Value::as_str).map(String::from)
            })
            .unwrap_or(body);

        return Err(ReplicateError::Api {
            status: status.as_u16(),
            detail,
        });
    }

    Ok(response.json::<T>().await?)
}

/// The version id from an `owner/name:version` reference.
#[must_use]
pub fn version_of(model: &str) -> &str {
    model.rsplit_once(':').map_or(model, |(_, version)| version)
}

/// The first URL in a prediction output, which is either a string or a list
/// of strings depending on the model.
#[must_use]
pub fn output_url(output: Option<&Value>) -> Option<String> {
    match output? {
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(String::from),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), String::from)
}
