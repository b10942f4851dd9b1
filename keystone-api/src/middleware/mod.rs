pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{require_auth, Claims};
pub use rate_limit::rate_limit_middleware;
pub use request_id::{request_id_middleware, REQUEST_ID_HEADER};
