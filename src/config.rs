use clap::Parser;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://oreo.gleeze.com/api/autodl";

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "vidsnap-gateway")]
#[command(about = "Rate limited proxy in front of a video extraction API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    // Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Extraction API endpoint
    #[arg(short, long, env = "UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    // Credential sent as the api_key query parameter
    #[arg(long, env = "API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = 30)]
    pub rate_limit: u32,

    // Rate limit window in milliseconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_MS", default_value_t = 60_000)]
    pub rate_window_ms: u64,

    // Upstream call budget in milliseconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = 45_000)]
    pub upstream_timeout_ms: u64,

    // Max number of clients tracked by the rate limiter
    #[arg(long, env = "RATE_LIMIT_MAX_CLIENTS", default_value_t = 10_000)]
    pub max_clients: usize,

    // Idle window sweep interval in seconds
    #[arg(long, env = "RATE_LIMIT_SWEEP_SECS", default_value_t = 60)]
    pub sweep_interval: u64,

    // Read the client address from X-Forwarded-For / X-Real-IP
    #[arg(long, env = "TRUST_PROXY", default_value_t = false)]
    pub trust_proxy: bool,
}

impl Args {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit,
            window: Duration::from_millis(self.rate_window_ms),
            max_clients: self.max_clients,
            trust_proxy: self.trust_proxy,
        }
    }

    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            endpoint: self.upstream_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_millis(self.upstream_timeout_ms),
        }
    }

    pub fn sweep_every(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    pub max_clients: usize,
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_millis(60_000),
            max_clients: 10_000,
            trust_proxy: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}
