use axum::{Json, extract::State, extract::rejection::JsonRejection};
use std::sync::Arc;
use tracing::info;
use crate::error::DownloadError;
use crate::metrics::DOWNLOAD_REQUESTS;
use crate::models::{DownloadRequest, DownloadResponse};
use crate::normalize::{Outcome, shape};
use crate::state::AppState;

const LOG_URL_CHARS: usize = 50;

pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<DownloadResponse>, DownloadError> {
    DOWNLOAD_REQUESTS.inc();

    let Json(request) =
        payload.map_err(|rejection| DownloadError::InvalidBody(rejection.body_text()))?;

    let url = request
        .url
        .clone()
        .filter(|url| !url.is_empty())
        .ok_or(DownloadError::MissingUrl)?;

    let stream = request.stream_param();
    let preview: String = url.chars().take(LOG_URL_CHARS).collect();
    info!(url = %preview, stream = %stream, "processing URL");

    let payload = state.upstream.extract(&url, &stream).await?;

    let outcome = shape(&url, payload);
    if let Outcome::Business(data) = &outcome {
        info!(error = %data["error"], "upstream could not process video");
    }

    Ok(Json(DownloadResponse {
        success: true,
        data: outcome.into_data(),
    }))
}
