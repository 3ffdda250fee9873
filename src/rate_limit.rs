use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::error::DownloadError;
use crate::metrics::{RATE_LIMITED_TOTAL, TRACKED_CLIENTS};
use crate::state::AppState;

// Request timestamps of one client, oldest first
#[derive(Debug, Default)]
pub struct ClientWindow {
    hits: VecDeque<Instant>,
}

impl ClientWindow {
    // Drop every timestamp that is no longer inside the trailing window
    fn purge(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) < window {
                break;
            }
            self.hits.pop_front();
        }
    }

    fn last_seen(&self) -> Option<Instant> {
        self.hits.back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted { remaining: u32 },
    Rejected { retry_after: Duration },
}

/// Sliding window limiter: at most `max_requests` per client in any
/// trailing `window`.
pub struct RateLimiter {
    windows: DashMap<String, ClientWindow>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Record a request from `client` and decide whether it may proceed.
    ///
    /// The per-client decision is atomic. The `max_clients` cap is not: the
    /// capacity test and the insert take separate locks, so a burst of new
    /// clients arriving together can overshoot the cap by up to the number of
    /// concurrent callers until the next new client or sweep.
    pub fn check(&self, client: &str) -> Decision {
        let now = self.clock.now();

        if !self.windows.contains_key(client) && self.windows.len() >= self.config.max_clients {
            self.make_room(now);
        }

        // The entry guard keeps the shard write-locked for the whole
        // purge/compare/append sequence.
        let mut window = self.windows.entry(client.to_string()).or_default();
        window.purge(now, self.config.window);

        let max = self.config.max_requests as usize;
        if window.hits.len() >= max {
            let retry_after = window
                .hits
                .front()
                .map(|oldest| {
                    self.config
                        .window
                        .saturating_sub(now.saturating_duration_since(*oldest))
                })
                .unwrap_or(self.config.window);
            return Decision::Rejected { retry_after };
        }

        window.hits.push_back(now);
        Decision::Admitted {
            remaining: (max - window.hits.len()) as u32,
        }
    }

    /// Forget clients with nothing left in their window. Returns how many
    /// were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(self.clock.now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let window = self.config.window;
        let before = self.windows.len();
        self.windows.retain(|_, client| {
            client.purge(now, window);
            !client.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    // Called when a new client shows up and the map is full. Sweeps first;
    // only if nothing was idle does it scan every client (O(n)) for the
    // least recently active one.
    fn make_room(&self, now: Instant) {
        let swept = self.sweep_at(now);
        if self.windows.len() < self.config.max_clients {
            debug!(swept, "rate limiter made room by sweeping idle clients");
            return;
        }

        let stalest = self
            .windows
            .iter()
            .min_by_key(|entry| entry.value().last_seen())
            .map(|entry| entry.key().clone());

        if let Some(key) = stalest {
            self.windows.remove(&key);
            warn!(
                evicted = %key,
                max_clients = self.config.max_clients,
                "rate limiter full, evicted least recently active client"
            );
        }
    }
}

// Background task - sweeps idle client windows on a fixed period
pub async fn window_sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // first tick fires immediately
    interval.tick().await;

    debug!(interval = ?every, "rate limit sweeper started");

    loop {
        interval.tick().await;
        let removed = limiter.sweep();
        let remaining = limiter.tracked_clients();
        TRACKED_CLIENTS.set(remaining as f64);
        if removed > 0 {
            debug!(removed, remaining, "swept idle rate limit windows");
        }
    }
}

/// Identify the caller: proxy headers when trusted, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let limiter = &state.rate_limiter;
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer, limiter.config().trust_proxy);

    let decision = limiter.check(&client);
    TRACKED_CLIENTS.set(limiter.tracked_clients() as f64);

    match decision {
        Decision::Admitted { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(limiter.config().max_requests),
            );
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        Decision::Rejected { retry_after } => {
            RATE_LIMITED_TOTAL.inc();
            warn!(client = %client, path = %request.uri().path(), "rate limit exceeded");

            let secs = retry_after.as_millis().div_ceil(1000).max(1) as u64;
            let mut response = DownloadError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}
