use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::api::errors::ApiError;

/// Header carrying the acting judge, set by the identity provider in front of the API
pub const JUDGE_ID_HEADER: &str = "x-judge-id";

/// Judge identity extractor for scoring routes
///
/// Usage:
/// ```rust,ignore
/// async fn scoring_handler(
///     JudgeId(judge_id): JudgeId,
/// ) -> Result<String, ApiError> {
///     Ok(format!("Scoring as {}", judge_id))
/// }
/// ```
pub struct JudgeId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for JudgeId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let judge_id = parts
            .headers
            .get(JUDGE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing judge identity header"))?;

        Ok(JudgeId(judge_id.to_string()))
    }
}
