use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Rejections raised while turning CLI flags or request payloads into a
/// projection. The engine itself never fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be at most {max} years, got {value}")]
    HorizonTooLong {
        field: &'static str,
        value: f64,
        max: u32,
    },

    #[error("invalid intermediate contribution '{0}': expected YEAR:AMOUNT")]
    ContributionFormat(String),

    #[error("invalid request payload: {0}")]
    Payload(String),

    #[error("failed to render projection: {0}")]
    Render(String),
}

impl IntoResponse for InputError {
    fn into_response(self) -> Response {
        let status = match &self {
            InputError::Render(_) => {
                log::error!("projection rendering failed: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => {
                log::warn!("rejected projection request: {self}");
                StatusCode::BAD_REQUEST
            }
        };
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type InputResult<T> = Result<T, InputError>;
