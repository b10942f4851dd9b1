use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use keystone_core::repository::UserRepository;
use keystone_order::OrderWorkflow;
use keystone_shared::Masked;
use keystone_store::app_config::RateLimitConfig;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::Metrics;

pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub orders: Arc<OrderWorkflow>,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
    pub limiter: Arc<GlobalRateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        orders: Arc<OrderWorkflow>,
        auth: AuthConfig,
        rate_limit: &RateLimitConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            users,
            orders,
            auth,
            metrics,
            limiter: Arc::new(rate_limiter(rate_limit)),
            started_at: Instant::now(),
        }
    }
}

/// One token bucket for the whole service. Zero values fall back to one
/// request per second.
pub fn rate_limiter(config: &RateLimitConfig) -> GlobalRateLimiter {
    let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(config.burst).unwrap_or(per_second);
    RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst))
}
