use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use inference::{ClassifyError, PostprocessError};
use preprocess::PreprocessError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EMPTY_BODY_MESSAGE: &str = "Send raw image bytes in the POST body (binary).";

/// Every failure a request can end in; the only place errors become statuses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Send raw image bytes in the POST body (binary).")]
    EmptyBody,

    /// The body could not be read, e.g. it exceeded the configured limit.
    #[error("request body rejected: {0}")]
    Body(#[from] BytesRejection),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("model initialization failed: {0:#}")]
    Load(anyhow::Error),

    #[error("classification task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyBody => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Classify(_) | ApiError::Load(_) | ApiError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label for metrics and logs.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::EmptyBody => "empty_body",
            ApiError::Body(_) => "body_rejected",
            ApiError::Classify(ClassifyError::Preprocess(PreprocessError::Decode(_))) => {
                "decode_error"
            }
            ApiError::Classify(ClassifyError::Preprocess(_)) => "preprocess_error",
            ApiError::Classify(ClassifyError::Inference(_)) => "inference_error",
            ApiError::Classify(ClassifyError::Postprocess(PostprocessError::EmptyOutput)) => {
                "empty_output"
            }
            ApiError::Classify(ClassifyError::Postprocess(PostprocessError::NonFiniteOutput {
                ..
            })) => "non_finite_output",
            ApiError::Load(_) => "model_unavailable",
            ApiError::Join(_) => "internal_error",
        }
    }

    /// Message safe to hand back to the caller. Engine and loader errors may
    /// carry paths or runtime internals, so those stay in the logs only.
    fn public_message(&self) -> String {
        match self {
            ApiError::EmptyBody => EMPTY_BODY_MESSAGE.to_string(),
            ApiError::Body(rejection) => rejection.body_text(),
            ApiError::Classify(ClassifyError::Preprocess(PreprocessError::Decode(e))) => {
                format!("Could not decode image: {}", e)
            }
            ApiError::Classify(ClassifyError::Preprocess(_)) => {
                "Image preprocessing failed".to_string()
            }
            ApiError::Classify(ClassifyError::Inference(_)) => "Inference failed".to_string(),
            ApiError::Classify(ClassifyError::Postprocess(PostprocessError::EmptyOutput)) => {
                "Model produced no output".to_string()
            }
            ApiError::Classify(ClassifyError::Postprocess(PostprocessError::NonFiniteOutput {
                ..
            })) => "Model produced an invalid output".to_string(),
            ApiError::Load(_) => "Model is not available".to_string(),
            ApiError::Join(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %self, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %self, "Client error");
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_a_client_error() {
        let err = ApiError::EmptyBody;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), EMPTY_BODY_MESSAGE);
    }

    #[test]
    fn test_pipeline_errors_are_server_errors() {
        let errors = [
            ApiError::Classify(ClassifyError::Inference(anyhow::anyhow!("boom"))),
            ApiError::Classify(ClassifyError::Postprocess(PostprocessError::EmptyOutput)),
            ApiError::Classify(ClassifyError::Postprocess(
                PostprocessError::NonFiniteOutput { index: 3 },
            )),
            ApiError::Load(anyhow::anyhow!("missing model.onnx")),
        ];

        for err in errors {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", err);
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = ApiError::Load(anyhow::anyhow!("/secret/path/model.onnx not found"));
        assert_eq!(err.code(), "model_unavailable");
        assert!(!err.public_message().contains("/secret"));
        assert!(err.to_string().contains("/secret"));
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = ApiError::EmptyBody.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, EMPTY_BODY_MESSAGE);
    }
}
