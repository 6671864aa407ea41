use aws_config::{BehaviorVersion, meta::region::RegionProviderChain};
use figment::{Figment, providers::Env};
use serde::de::DeserializeOwned;

/// Builds the long-lived state of a service from its configuration and the
/// shared AWS configuration. Implementations construct every client once;
/// the result is handed to request handlers by shared reference.
pub trait ContextProvider<Config> {
    fn new(
        config: Config,
        aws_config: aws_config::SdkConfig,
    ) -> impl Future<Output = Self>;
}

/// Install the JSON log subscriber used by every service.
///
/// <https://docs.aws.amazon.com/lambda/latest/dg/rust-logging.html>
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        // allow log level to be overridden by RUST_LOG env var
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        // this needs to be set to false, otherwise ANSI color codes will
        // show up in a confusing manner in CloudWatch logs.
        .with_ansi(false)
        // CloudWatch adds the ingestion time.
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        .init();
}

/// Extract a configuration struct from the process environment.
///
/// Variable names are matched case-insensitively against the struct's
/// field names, so `STORAGE_BUCKET` fills `storage_bucket`.
///
/// # Errors
/// If a required field is missing or a value has the wrong shape.
pub fn load_config<Config: DeserializeOwned>() -> Result<Config, figment::Error>
{
    Figment::new().merge(Env::raw()).extract()
}

/// Load the AWS configuration from the default provider chain, falling back
/// to `us-east-1` when no region is configured.
pub async fn load_aws_config() -> aws_config::SdkConfig {
    let region_provider =
        RegionProviderChain::default_provider().or_else("us-east-1");

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

/// Initialize logging, then build the application context from environment
/// configuration and the default AWS configuration.
///
/// # Errors
/// If the configuration cannot be extracted from the environment variables.
pub async fn create_app_context<A, Config: DeserializeOwned>()
-> Result<A, figment::Error>
where
    A: ContextProvider<Config>,
{
    init_tracing();

    let config: Config = load_config()?;

    let aws_config = load_aws_config().await;

    tracing::info!("application configuration loaded");

    Ok(A::new(config, aws_config).await)
}
