pub mod health;
pub mod metrics;
pub mod query;
pub mod session;
pub mod upload;
