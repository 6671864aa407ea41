use redact::Secret;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_REPLICATE_API_URL: &str = "https://api.replicate.com/v1";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Bucket holding both `avatars/default/*` and `generated_videos/*`.
    pub storage_bucket: String,

    #[serde(default = "default_video_creations_table")]
    pub video_creations_table: String,

    #[serde(default)]
    pub replicate_api_token: Option<Secret<String>>,

    /// Secrets Manager secret holding the token, used when
    /// `replicate_api_token` is not set.
    #[serde(default)]
    pub replicate_secret_arn: Option<String>,

    #[serde(default = "default_replicate_api_url")]
    pub replicate_api_url: String,

    #[serde(default = "default_replicate_poll_interval_ms")]
    pub replicate_poll_interval_ms: u64,

    #[serde(default)]
    pub public_url_base: Option<String>,

    /// Send the `public-read` canned ACL with published videos. Disable
    /// for buckets with ACLs disabled and grant read access by bucket
    /// policy instead.
    #[serde(default = "default_public_read_acl")]
    pub public_read_acl: bool,

    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Config {
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// The directly configured token, ignoring blank values.
    #[must_use]
    pub fn inline_replicate_token(&self) -> Option<&Secret<String>> {
        self.replicate_api_token
            .as_ref()
            .filter(|token| !token.expose_secret().trim().is_empty())
    }
}

fn default_video_creations_table() -> String {
    "video_creations".to_string()
}

fn default_replicate_api_url() -> String {
    DEFAULT_REPLICATE_API_URL.to_string()
}

const fn default_public_read_acl() -> bool {
    true
}

const fn default_replicate_poll_interval_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("talking-avatar/{}", env!("CARGO_PKG_VERSION"))
}
