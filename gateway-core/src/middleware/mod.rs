pub mod metrics;
pub mod rate_limit;
pub mod tracing;

pub use metrics::metrics_middleware;
pub use rate_limit::{ip_rate_limit_middleware, RouteLimiter};
pub use tracing::{request_id_middleware, REQUEST_ID_HEADER};
