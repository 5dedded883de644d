//! Employee directory search with per-client throttling.
//!
//! - [`filtering`] validates request parameters and builds the SQL predicate
//! - [`columns`] caches which employee columns are visible
//! - [`engine`] runs the count and page queries
//! - [`rate_limit`] is the token-bucket limiter in front of every request
//! - [`routes`] wires it all into an axum router

pub mod columns;
pub mod config;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod filtering;
pub mod rate_limit;
pub mod routes;
pub mod validation;

pub use columns::{ColumnConfiguration, ColumnResolver, ColumnSource};
pub use config::{AppConfig, ConfigError};
pub use engine::{EmployeeRecord, SearchEngine, SearchResult};
pub use errors::{ApiError, SearchError};
pub use filtering::{Pagination, SearchFilter, TextMatch, TextSearchMode};
pub use rate_limit::{Clock, RateInterval, RateLimitConfig, RateLimiter, SystemClock};
pub use routes::{AppState, router};
pub use validation::ValidationError;
