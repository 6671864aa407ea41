use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lambda_http::RequestExt;

/// Header set by function hosts that expose a per-invocation identifier.
pub const EXECUTION_ID_HEADER: &str = "function-execution-id";

/// Identifier unique to one invocation, safe to embed in file names.
///
/// Resolution order:
/// 1. the Lambda request id,
/// 2. the `Function-Execution-Id` header, suffixed with a fresh
///    time-ordered UUID so two requests never share an id,
/// 3. a freshly generated time-ordered UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionId(pub String);

impl ExecutionId {
    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        let from_lambda = parts
            .lambda_context_ref()
            .and_then(|ctx| sanitize(&ctx.request_id));

        if let Some(id) = from_lambda {
            return Self(id);
        }

        parts
            .headers
            .get(EXECUTION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(sanitize)
            .map_or_else(Self::generate, |id| {
                Self(format!("{id}_{}", Self::generate()))
            })
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for ExecutionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let execution_id = Self::from_parts(parts);
        tracing::debug!(execution_id = %execution_id, "resolved execution id");
        Ok(execution_id)
    }
}

// Keeps ids usable as a file name component.
fn sanitize(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(128)
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
