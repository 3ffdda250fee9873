mod health;
mod metrics;
mod download;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use download::download_handler;
