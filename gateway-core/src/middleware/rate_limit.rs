use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

/// Rate limiter keyed by client IP address.
pub type IpRateLimiter = Arc<RateLimiter<SocketAddr, DashMapStateStore<SocketAddr>, DefaultClock>>;

/// An IP-keyed limiter for one route class. The operation name and limit are
/// carried so 429 responses can name the limited operation and emit the
/// `ratelimit-limit` header.
#[derive(Clone)]
pub struct RouteLimiter {
    operation: Arc<str>,
    limit: u32,
    limiter: IpRateLimiter,
}

impl RouteLimiter {
    pub fn new(operation: &str, attempts: u32, window_seconds: u64) -> Self {
        Self {
            operation: Arc::from(operation),
            limit: attempts,
            limiter: create_ip_rate_limiter(attempts, window_seconds),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Create a keyed rate limiter (by IP)
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let attempts = attempts.max(1);
    let period = Duration::from_millis((window_seconds * 1000) / attempts as u64);
    let quota = Quota::with_period(period)
        .expect("Failed to create quota with valid period")
        .allow_burst(NonZeroU32::new(attempts).expect("attempts is guaranteed to be non-zero"));

    Arc::new(RateLimiter::dashmap(quota))
}

/// Resolve the client address, trusting the first `x-forwarded-for` hop when
/// the gateway sits behind a proxy.
fn client_addr(request: &Request) -> Option<SocketAddr> {
    let forwarded_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<std::net::IpAddr>().ok());

    if let Some(ip) = forwarded_ip {
        Some(SocketAddr::new(ip, 0))
    } else {
        request
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|axum::extract::ConnectInfo(addr)| *addr)
    }
}

/// Middleware for IP-based rate limiting of one route class.
pub async fn ip_rate_limit_middleware(
    State(route): State<RouteLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match client_addr(&request) {
        Some(addr) => match route.limiter.check_key(&addr) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                tracing::warn!(
                    operation = %route.operation(),
                    client = %addr.ip(),
                    "Rate limit exceeded"
                );
                Err(AppError::TooManyRequests {
                    operation: route.operation().to_string(),
                    limit: route.limit(),
                    retry_after: wait_time.as_secs().max(1),
                })
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
