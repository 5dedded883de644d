//! # Error Handling
//!
//! Two layers:
//! - [`SearchError`] is what the search core returns: either the request was
//!   invalid or the storage failed.
//! - [`ApiError`] is what the HTTP boundary sends back. Each variant maps to one
//!   status code and a client-safe message; storage details only go to the log.
//!
//! ```rust,ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     Json(body): Json<Value>,
//! ) -> Result<Json<SearchResult>, ApiError> {
//!     let filter = SearchFilter::try_from(&body)?; // 400
//!     let result = state.engine.search(&filter).await?; // 500 on storage failure
//!     Ok(Json(result))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;

use crate::validation::ValidationError;

/// Failure of a search request inside the core.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Malformed or out-of-range input; raised before any storage access
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The data store was unreachable or a query failed. No partial result is
    /// ever returned alongside it.
    #[error("storage error: {0}")]
    Storage(#[from] DbErr),
}

const STORAGE_MESSAGE: &str = "A database error occurred";

/// Everything the HTTP layer can answer with besides a search result.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400, message names the offending field
    #[error("{}", .0.message)]
    Validation(ValidationError),

    /// 400, the body could not be decoded at all
    #[error("{0}")]
    MalformedBody(String),

    /// 400, the query string could not be decoded
    #[error("{0}")]
    MalformedQuery(String),

    /// 404
    #[error("Endpoint not found")]
    NotFound,

    /// 405
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// 429, the client's bucket is empty
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 500; the client only ever sees a generic message
    #[error("A database error occurred")]
    Storage(DbErr),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MalformedBody(_) | Self::MalformedQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Storage(err) => tracing::error!(error = ?err, "search failed in storage"),
            Self::Validation(err) => {
                tracing::debug!(field = %err.field, error = %err, "rejected search request");
            }
            other => tracing::debug!(status = %status, error = %other, "request refused"),
        }

        let message = match &self {
            Self::Storage(_) => STORAGE_MESSAGE.to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::Storage(err)
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(err) => Self::Validation(err),
            SearchError::Storage(err) => Self::Storage(err),
        }
    }
}
