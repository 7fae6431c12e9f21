//! Infrastructure layer - External service implementations

pub mod cache;
pub mod history;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod rate_limit;
pub mod search;
pub mod services;
