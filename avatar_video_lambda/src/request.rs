use serde_json::{Map, Value};
use types::{DEFAULT_USER_ID, GenerateVideoRequest};

use crate::error::GenerateVideoError;

/// Parse and validate a raw request body.
///
/// The body must be a non-empty JSON object carrying non-empty
/// `script_text` and `avatar_id` strings. `user_id` falls back to
/// [`DEFAULT_USER_ID`] when absent, `null` or empty.
///
/// # Errors
/// [`GenerateVideoError::InvalidRequest`] describing the first problem found.
pub fn parse_request(
    body: &[u8],
) -> Result<GenerateVideoRequest, GenerateVideoError> {
    let payload = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => map,
        Ok(_) | Err(_) => {
            return Err(GenerateVideoError::InvalidRequest(
                "No JSON payload.".to_string(),
            ));
        }
    };

    let script_text = required_string(&payload, "script_text")?;
    let avatar_id = required_string(&payload, "avatar_id")?;

    let user_id = match payload.get("user_id") {
        None | Some(Value::Null) => DEFAULT_USER_ID.to_string(),
        Some(Value::String(user_id)) if user_id.is_empty() => {
            DEFAULT_USER_ID.to_string()
        }
        Some(Value::String(user_id)) => user_id.clone(),
        Some(_) => {
            return Err(GenerateVideoError::InvalidRequest(
                "'user_id' must be a string.".to_string(),
            ));
        }
    };

    Ok(GenerateVideoRequest {
        script_text,
        avatar_id,
        user_id,
    })
}

fn required_string(
    payload: &Map<String, Value>,
    field: &str,
) -> Result<String, GenerateVideoError> {
    match payload.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        _ => Err(GenerateVideoError::InvalidRequest(format!(
            "'{field}' cannot be empty or is missing."
        ))),
    }
}
