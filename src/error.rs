use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

use crate::models::ErrorBody;

/// Failures surfaced to the client as `{ success: false, message }`.
///
/// Video-specific failures reported by the upstream are not errors here; they
/// travel as a successful envelope (see `normalize::Outcome::Business`).
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Please enter a video URL")]
    MissingUrl,

    #[error("Invalid request body.")]
    InvalidBody(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("Request timeout. Please check your connection and try again.")]
    UpstreamTimeout,

    #[error("{}", status_message(*status))]
    UpstreamStatus { status: StatusCode },

    #[error("Unable to process your request. Please try again.")]
    Unknown(String),
}

// User facing text for an upstream HTTP failure
fn status_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        404 => "Video not found. Please check the URL.",
        403 => "Access denied. The video might be private or restricted.",
        s if s >= 500 => "Server error. Please try again in a few moments.",
        _ => "Service temporarily unavailable.",
    }
}

impl DownloadError {
    pub fn status(&self) -> StatusCode {
        match self {
            DownloadError::MissingUrl | DownloadError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            DownloadError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DownloadError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            DownloadError::UpstreamStatus { status } => *status,
            DownloadError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        match &self {
            DownloadError::Unknown(detail) => error!(detail = %detail, "download failed"),
            DownloadError::InvalidBody(detail) => debug!(detail = %detail, "rejected download body"),
            _ => {}
        }
        let body = ErrorBody {
            success: false,
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
