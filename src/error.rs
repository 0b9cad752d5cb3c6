use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("No voice sample provided")]
    NoVoiceSample,

    #[error("Invalid personality name: {0}")]
    InvalidName(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("TTS generation failed: {0}")]
    TtsError(String),

    #[error("Server is shutting down")]
    ShuttingDown,

    #[error("Invalid form data: {0}")]
    Multipart(#[from] MultipartError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NoVoiceSample => (
                StatusCode::BAD_REQUEST,
                "NO_VOICE_SAMPLE",
                self.to_string(),
            ),
            AppError::InvalidName(name) => (
                StatusCode::BAD_REQUEST,
                "INVALID_NAME",
                format!("Invalid personality name '{}'", name),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::TtsError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TTS_ERROR",
                msg.clone(),
            ),
            AppError::ShuttingDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SHUTTING_DOWN",
                self.to_string(),
            ),
            AppError::Multipart(e) => {
                let status = e.status();
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "PAYLOAD_TOO_LARGE"
                } else {
                    "BAD_REQUEST"
                };
                (status, code, e.body_text())
            }
            AppError::IoError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                e.to_string(),
            ),
        };

        tracing::error!("Request failed: {} - {}", code, message);

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_voice_sample_is_bad_request_with_fixed_message() {
        let err = AppError::NoVoiceSample;
        assert_eq!(err.to_string(), "No voice sample provided");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn shutting_down_is_unavailable() {
        let response = AppError::ShuttingDown.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn io_errors_are_server_errors() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
