use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Required parameter is missing: {0}")]
    RequiredParameter(String),

    #[error("Invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("Unsupported schema: {0}")]
    UnsupportedSchema(String),

    #[error("Azure request failed: {0}")]
    Azure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PluginError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        PluginError::InvalidParameter {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Validation failures are raised before any call leaves the process.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PluginError::RequiredParameter(_)
                | PluginError::InvalidParameter { .. }
                | PluginError::UnsupportedSchema(_)
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            PluginError::RequiredParameter(_) => "ERROR_REQUIRED_PARAMETER",
            PluginError::InvalidParameter { .. } => "ERROR_INVALID_PARAMETER",
            PluginError::UnsupportedSchema(_) => "ERROR_UNSUPPORTED_SCHEMA",
            PluginError::Azure(_) => "ERROR_AZURE_REQUEST",
            PluginError::Internal(_) => "ERROR_INTERNAL",
        }
    }
}

impl From<reqwest::Error> for PluginError {
    fn from(err: reqwest::Error) -> Self {
        PluginError::Azure(err.to_string())
    }
}

impl From<JsonRejection> for PluginError {
    fn from(rejection: JsonRejection) -> Self {
        PluginError::invalid("body", rejection.body_text())
    }
}

impl From<PluginError> for tonic::Status {
    fn from(err: PluginError) -> Self {
        let message = format!("{}: {}", err.code(), err);
        if err.is_validation() {
            tonic::Status::invalid_argument(message)
        } else {
            tonic::Status::internal(message)
        }
    }
}

impl IntoResponse for PluginError {
    fn into_response(self) -> Response {
        let status = match self {
            PluginError::RequiredParameter(_)
            | PluginError::InvalidParameter { .. }
            | PluginError::UnsupportedSchema(_) => StatusCode::BAD_REQUEST,
            PluginError::Azure(_) => StatusCode::BAD_GATEWAY,
            PluginError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "code": self.code(),
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_invalid_argument() {
        let status: tonic::Status = PluginError::RequiredParameter("resource".into()).into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert!(status.message().contains("ERROR_REQUIRED_PARAMETER"));
        assert!(status.message().contains("resource"));
    }

    #[test]
    fn test_azure_errors_are_generic() {
        let status: tonic::Status = PluginError::Azure("429 Too Many Requests".into()).into();
        assert_eq!(status.code(), tonic::Code::Internal);

        let response = PluginError::Azure("401".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_http_status_for_validation() {
        let response = PluginError::invalid("period", "must be positive").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
