//! HTTP boundary: request decoding, throttling and response mapping.

use axum::{
    Json, Router,
    extract::{
        ConnectInfo, Query, Request, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::engine::{SearchEngine, SearchResult};
use crate::errors::ApiError;
use crate::filtering::SearchFilter;
use crate::rate_limit::RateLimiter;

pub const SEARCH_PATH: &str = "/api/v1/employees/search";

/// Client id used when neither the peer address nor a trusted header is known
pub const UNKNOWN_CLIENT: &str = "unknown";

const SCALAR_PARAMS: [&str; 3] = ["q", "limit", "page"];
const COMMA_LIST_PARAMS: [&str; 4] =
    ["company_ids", "department_ids", "position_ids", "statuses"];
// location values carry commas themselves ("New York, NY")
const REPEATED_LIST_PARAMS: [&str; 1] = ["locations"];

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub limiter: Arc<RateLimiter>,
    pub trust_forwarded_for: bool,
}

/// Build the service router. Every request, including unknown paths, passes
/// the rate limiter first.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            SEARCH_PATH,
            get(search_by_query)
                .post(search_by_body)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}

async fn search_by_body(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;
    let filter = SearchFilter::try_from(&body)?;
    Ok(Json(state.engine.search(&filter).await?))
}

async fn search_by_query(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Query(pairs) = query.map_err(malformed_query)?;
    let filter = SearchFilter::from_params(&query_params(pairs))?;
    Ok(Json(state.engine.search(&filter).await?))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> impl IntoResponse {
    ([(header::ALLOW, "GET,POST")], ApiError::MethodNotAllowed)
}

fn malformed_query(rejection: QueryRejection) -> ApiError {
    ApiError::MalformedQuery(rejection.body_text())
}

/// Fold query-string pairs into the same shape a JSON body would have.
///
/// Scalars keep their last occurrence. Id lists and statuses accept
/// comma-separated values and repeated keys; locations only repeated keys.
/// Unknown keys are ignored.
#[must_use]
pub fn query_params(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut params = Map::new();

    for (key, value) in pairs {
        if SCALAR_PARAMS.contains(&key.as_str()) {
            params.insert(key, Value::String(value));
        } else if COMMA_LIST_PARAMS.contains(&key.as_str()) {
            let items = value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()));
            append(&mut params, key, items);
        } else if REPEATED_LIST_PARAMS.contains(&key.as_str()) {
            append(&mut params, key, [Value::String(value)]);
        }
    }

    params
}

fn append(params: &mut Map<String, Value>, key: String, items: impl IntoIterator<Item = Value>) {
    match params.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
        Value::Array(existing) => existing.extend(items),
        other => *other = Value::Array(items.into_iter().collect()),
    }
}

/// Reject throttled clients before any storage work happens.
async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = client_id(&request, state.trust_forwarded_for);

    if state.limiter.is_allowed(&client) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        ApiError::RateLimited.into_response()
    }
}

/// First `X-Forwarded-For` entry when trusted, then the peer IP.
fn client_id(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for
        && let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), |info| info.0.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_scalar_last_occurrence_wins() {
        let params = query_params(pairs(&[("limit", "10"), ("limit", "20"), ("q", "jo")]));
        assert_eq!(params["limit"], "20");
        assert_eq!(params["q"], "jo");
    }

    #[test]
    fn test_comma_lists_and_repeated_keys_merge() {
        let params = query_params(pairs(&[
            ("company_ids", "1,2"),
            ("company_ids", "3"),
            ("statuses", "Active, On leave"),
        ]));
        assert_eq!(params["company_ids"], serde_json::json!(["1", "2", "3"]));
        assert_eq!(params["statuses"], serde_json::json!(["Active", "On leave"]));
    }

    #[test]
    fn test_locations_keep_their_commas() {
        let params = query_params(pairs(&[
            ("locations", "New York, NY"),
            ("locations", "Boston"),
        ]));
        assert_eq!(
            params["locations"],
            serde_json::json!(["New York, NY", "Boston"])
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let params = query_params(pairs(&[("sort", "salary"), ("q", "x")]));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_query_params_feed_the_normalizer() {
        let params = query_params(pairs(&[
            ("company_ids", "1,2"),
            ("limit", "5"),
            ("page", "2"),
        ]));
        let filter = SearchFilter::from_params(&params).unwrap();
        assert_eq!(filter.company_ids(), [1, 2]);
        assert_eq!(filter.limit(), 5);
        assert_eq!(filter.offset(), 5);

        let params = query_params(pairs(&[("limit", "10.5")]));
        assert!(SearchFilter::from_params(&params).is_err());
    }

    #[test]
    fn test_query_rejection_is_a_json_400() {
        #[derive(Debug, serde::Deserialize)]
        struct Paged {
            #[allow(dead_code)]
            page: u32,
        }

        let uri: axum::http::Uri = "/search?page=first".parse().unwrap();
        let rejection = Query::<Paged>::try_from_uri(&uri).unwrap_err();
        let err = malformed_query(rejection);
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(matches!(err, ApiError::MalformedQuery(message) if !message.is_empty()));
    }

    #[test]
    fn test_client_id_prefers_trusted_forwarded_header() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_id(&request, true), "203.0.113.7");
        assert_eq!(client_id(&request, false), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_client_id_uses_peer_address() {
        let mut request = axum::http::Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 5555))));
        assert_eq!(client_id(&request, false), "192.168.1.20");
    }
}
