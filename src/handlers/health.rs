use axum::Json;
use crate::models::HealthResponse;

pub const SERVICE_NAME: &str = "VidSnap Downloader API";

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}
