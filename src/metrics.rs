use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref DOWNLOAD_REQUESTS: Counter =
        register_counter!("vidsnap_download_requests_total", "Total number of download requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("vidsnap_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref UPSTREAM_ERRORS: Counter =
        register_counter!("vidsnap_upstream_errors_total", "Failed calls to the extraction API").unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "vidsnap_upstream_latency_seconds",
        "Extraction API latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("vidsnap_tracked_clients", "Clients currently held by the rate limiter").unwrap();
}
