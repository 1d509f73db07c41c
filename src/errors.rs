use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data: missing file field or disallowed MIME type
    #[error("{message}")]
    BadRequest { message: String },

    /// The uploaded bytes could not be parsed by the extraction library
    #[error("failed to read {kind} upload: {message}")]
    Extraction { kind: &'static str, message: String },

    /// The generative-language API call failed or returned an unusable reply
    #[error("upstream model request failed: {message}")]
    Upstream { message: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Extraction { .. } | Error::Upstream { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            // The specific cause stays server-side; callers get the generic message
            Error::Extraction { .. } | Error::Upstream { .. } | Error::Other(_) => "Failed to process the file.".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Extraction { .. } | Error::Upstream { .. } | Error::Other(_) => {
                tracing::error!("Error processing file: {:#}", self);
            }
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream { message: err.to_string() }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
