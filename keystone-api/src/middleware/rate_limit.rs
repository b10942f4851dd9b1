use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.limiter.check().is_err() {
        tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
        return Err(AppError::TooManyRequests);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use crate::state::rate_limiter;
    use keystone_store::app_config::RateLimitConfig;

    #[test]
    fn test_burst_is_enforced() {
        let limiter = rate_limiter(&RateLimitConfig {
            requests_per_second: 1,
            burst: 2,
        });

        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
