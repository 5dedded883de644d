//! # Filtering & Search
//!
//! Turns raw request parameters into a parameterized predicate over the
//! `employees` table.
//!
//! ## Main Components
//!
//! - **[`SearchFilter`]**: validated, canonical parameters (`from_params`)
//! - **[`build_search_condition`]**: AND of every active filter's clause
//! - **[`TextMatch`]**: full-text (`SQLite` FTS5) or substring matching for `q`
//! - **[`Pagination`]**: `total`/`limit`/`offset`/`has_more` metadata
//!
//! ## Request Examples
//!
//! ```rust,ignore
//! // Name/email search limited to active staff
//! {"q": "john", "statuses": ["Active"]}
//!
//! // A single id or a list of ids
//! {"company_ids": 1, "department_ids": [2, 3]}
//!
//! // Partial location match, second page of 20
//! {"locations": ["New York"], "limit": 20, "page": 2}
//! ```
//!
//! ## Matching Rules
//!
//! - `q` matches first name, last name or email. `%` and `_` are stripped
//!   before matching and the term is always a bound parameter.
//! - Id lists and `statuses` are exact `IN (...)` clauses.
//! - `locations` are substring matches OR-ed together.
//! - Absent or empty filters impose no constraint.

pub mod conditions;
pub mod normalize;
pub mod pagination;
pub mod search;

pub use conditions::build_search_condition;
pub use normalize::{DEFAULT_LIMIT, MAX_LIMIT, SearchFilter, sanitize_like_term};
pub use pagination::Pagination;
pub use search::{FULLTEXT_TABLE, TextMatch, TextSearchMode, fulltext_available};
