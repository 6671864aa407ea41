use aws_sdk_secretsmanager::client::Client as SecretsManagerClient;
use redact::Secret;

/// Get the raw string value of a secret from the secrets manager.
///
/// # Arguments
///
/// * `secrets_manager` - The secrets manager client
/// * `secret_id` - The secret id or ARN
///
/// # Returns
///
/// * `Result<Secret<String>, String>` - The secret string
///
/// # Errors
///
/// * `String` - The error message if the operation fails. This error may
///   provide additional context on the failure.
///
pub async fn get_string(
    secrets_manager: &SecretsManagerClient,
    secret_id: &str,
) -> Result<Secret<String>, String> {
    let secret = secrets_manager
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("failed to get secret: {:?}", e);
            e.to_string()
        })?;

    secret
        .secret_string
        .map(Secret::new)
        .ok_or_else(|| "secret string not found".to_string())
}

/// Get a single token from a secret.
///
/// The secret may hold the token directly, or a JSON object with the token
/// stored under `field`.
///
/// # Arguments
///
/// * `secrets_manager` - The secrets manager client
/// * `secret_id` - The secret id or ARN
/// * `field` - The JSON field holding the token
///
/// # Returns
///
/// * `Result<Secret<String>, String>` - The token
///
/// # Errors
///
/// * `String` - The error message if the secret cannot be read or holds no
///   usable token.
///
pub async fn get_token(
    secrets_manager: &SecretsManagerClient,
    secret_id: &str,
    field: &str,
) -> Result<Secret<String>, String> {
    let secret_string = get_string(secrets_manager, secret_id).await?;

    extract_token(secret_string.expose_secret(), field)
}

/// Pull a token out of a secret string.
///
/// # Errors
///
/// * `String` - If the secret is a JSON object without a non-empty string
///   at `field`, or if the secret is blank.
pub fn extract_token(
    secret_string: &str,
    field: &str,
) -> Result<Secret<String>, String> {
    let trimmed = secret_string.trim();

    if trimmed.starts_with('{') {
        let value: serde_json::Value =
            serde_json::from_str(trimmed).map_err(|e| e.to_string())?;

        return value
            .get(field)
            .and_then(serde_json::Value::as_str)
            .filter(|token| !token.is_empty())
            .map(|token| Secret::new(token.to_string()))
            .ok_or_else(|| format!("secret has no '{field}' field"));
    }

    if trimmed.is_empty() {
        return Err("secret is empty".to_string());
    }

    Ok(Secret::new(trimmed.to_string()))
}
