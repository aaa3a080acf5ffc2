pub mod admin;
pub mod rate_limit;
pub mod session;

pub use admin::require_admin;
pub use rate_limit::{
    principal_rate_limit_middleware, source_rate_limit_middleware, RouteRateLimit,
};
pub use session::{session_middleware, AuthSession};
