//! Per-client request rate limiting
//!
//! Clients are keyed by IP: the first `X-Forwarded-For` entry when the API
//! runs behind a proxy, else the peer address. Quotas are enforced with
//! `governor`'s keyed GCRA limiter.

use crate::config::RateLimitConfig;
use crate::core::error::ApiError;
use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub const API_LIMIT_MESSAGE: &str = "Trop de requêtes, veuillez réessayer plus tard.";
pub const LOGIN_LIMIT_MESSAGE: &str =
    "Trop de tentatives de connexion. Veuillez réessayer dans 15 minutes.";

/// Above this many tracked clients, idle entries are dropped
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Keyed limiter shared by every request of one route group
#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    message: &'static str,
}

impl ClientRateLimiter {
    /// Allow a burst of `max` requests per client, refilled over `window`
    pub fn new(max: u32, window: Duration, message: &'static str) -> Result<Self> {
        let burst = NonZeroU32::new(max).context("rate limit must allow at least one request")?;
        let quota = Quota::with_period(window / burst.get())
            .context("rate limit window is too short")?
            .allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            message,
        })
    }

    /// Quota for every `/api` route
    pub fn api(config: &RateLimitConfig) -> Result<Self> {
        Self::new(
            config.api_max,
            Duration::from_secs(config.window_secs),
            API_LIMIT_MESSAGE,
        )
    }

    /// Stricter quota for login attempts
    pub fn login(config: &RateLimitConfig) -> Result<Self> {
        Self::new(
            config.login_max,
            Duration::from_secs(config.window_secs),
            LOGIN_LIMIT_MESSAGE,
        )
    }

    /// Consume one request for `client`; false once its quota is spent
    pub fn check(&self, client: &str) -> bool {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&client.to_string()).is_ok()
    }
}

/// Rate limit key of the request
pub fn client_key(request: &Request) -> String {
    forwarded_for(request)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Answer 429 once the client's quota is spent
///
/// Use with `axum::middleware::from_fn_with_state(limiter, rate_limit)`.
pub async fn rate_limit(
    State(limiter): State<ClientRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&request);
    if !limiter.check(&client) {
        tracing::warn!(%client, path = %request.uri().path(), "rate limit exceeded");
        return Err(ApiError::TooManyRequests(limiter.message.to_string()));
    }
    Ok(next.run(request).await)
}
