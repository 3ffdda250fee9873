use std::sync::Arc;
use crate::clock::Clock;
use crate::config::Args;
use crate::rate_limit::RateLimiter;
use crate::upstream::UpstreamClient;

// app's shared state
pub struct AppState {
    pub upstream: UpstreamClient,
    pub rate_limiter: Arc<RateLimiter>, // shared with the sweeper task
}

impl AppState {
    pub fn from_args(args: &Args, clock: Arc<dyn Clock>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            upstream: UpstreamClient::new(client, args.upstream_config()),
            rate_limiter: Arc::new(RateLimiter::new(args.rate_limit_config(), clock)),
        })
    }
}
