use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{config::Config, error::AppError};

struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window request counter keyed by client identity. Window state for
/// a client resets once the window length has elapsed; the map lock
/// serializes concurrent updates so no increment is lost.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    window_len: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(config: &Config) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window_len: config.rate_limit_window(),
            max_requests: config.rate_limit_requests,
        }
    }

    /// Records a request from `client_id` at `now` and decides whether it
    /// may proceed.
    pub fn allow(&self, client_id: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap();
        let window = windows.entry(client_id.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= self.window_len {
            window.started = now;
            window.count = 0;
        }

        window.count += 1;
        window.count <= self.max_requests
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        // Prefer proxy headers, fall back to the connection peer address
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        let client = req
            .headers()
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .or_else(|| {
                req.headers()
                    .get("x-forwarded-for")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
            })
            .or_else(|| remote_ip.as_deref())
            .unwrap_or("unknown")
            .trim()
            .to_string();

        if !self.allow(&client, Instant::now()) {
            tracing::info!("Rate limit exceeded for client {}", client);
            return AppError::RateLimitExceeded.into_response();
        }

        next.run(req).await
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
