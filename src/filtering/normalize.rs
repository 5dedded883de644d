use serde_json::{Map, Value};

use crate::validation::ValidationError;

/// Page size used when the request doesn't name one
pub const DEFAULT_LIMIT: u64 = 50;
/// Largest accepted page size
pub const MAX_LIMIT: u64 = 100;

// The offset is bound as a signed 64-bit SQL parameter.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Canonical, typed search parameters for a single request.
///
/// Built once by [`SearchFilter::from_params`] and read-only afterwards.
/// Every id is a positive integer, `limit` is within `1..=100`, `page` starts at 1
/// and `offset()` is guaranteed to fit a SQL offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    query: String,
    company_ids: Vec<i64>,
    department_ids: Vec<i64>,
    position_ids: Vec<i64>,
    locations: Vec<String>,
    statuses: Vec<String>,
    limit: u64,
    page: u64,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            company_ids: Vec::new(),
            department_ids: Vec::new(),
            position_ids: Vec::new(),
            locations: Vec::new(),
            statuses: Vec::new(),
            limit: DEFAULT_LIMIT,
            page: 1,
        }
    }
}

impl SearchFilter {
    /// Validate and coerce raw, JSON-decoded request parameters.
    ///
    /// Absent and `null` keys take their defaults. The first violation wins.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending field.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ValidationError> {
        let limit = match present(params, "limit") {
            None => DEFAULT_LIMIT,
            Some(value) => {
                let limit = coerce_int_strict(value, "limit")?;
                u64::try_from(limit)
                    .ok()
                    .filter(|limit| (1..=MAX_LIMIT).contains(limit))
                    .ok_or_else(|| {
                        ValidationError::new(
                            "limit",
                            format!("limit must be between 1 and {MAX_LIMIT}"),
                        )
                    })?
            }
        };

        let page = match present(params, "page") {
            None => 1,
            Some(value) => {
                let page = coerce_int_strict(value, "page")?;
                u64::try_from(page)
                    .ok()
                    .filter(|page| *page >= 1)
                    .ok_or_else(|| {
                        ValidationError::new("page", "page must be a positive integer")
                    })?
            }
        };

        let query = match present(params, "q") {
            None => String::new(),
            Some(Value::String(term)) => sanitize_like_term(term),
            Some(_) => return Err(ValidationError::new("q", "q must be a string")),
        };

        Self {
            query,
            company_ids: positive_int_list(params, "company_ids")?,
            department_ids: positive_int_list(params, "department_ids")?,
            position_ids: positive_int_list(params, "position_ids")?,
            locations: string_list(params, "locations")?,
            statuses: string_list(params, "statuses")?,
            limit: DEFAULT_LIMIT,
            page: 1,
        }
        .paginate(limit, page)
    }

    /// Replace the page window, re-checking the pagination bounds.
    ///
    /// # Errors
    ///
    /// Fails if `limit` is outside `1..=100`, `page` is zero, or the resulting
    /// offset would overflow.
    pub fn paginate(mut self, limit: u64, page: u64) -> Result<Self, ValidationError> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ValidationError::new(
                "limit",
                format!("limit must be between 1 and {MAX_LIMIT}"),
            ));
        }
        if page == 0 {
            return Err(ValidationError::new("page", "page must be a positive integer"));
        }
        (page - 1)
            .checked_mul(limit)
            .filter(|offset| *offset <= MAX_OFFSET)
            .ok_or_else(|| ValidationError::new("page", "page is too large"))?;

        self.limit = limit;
        self.page = page;
        Ok(self)
    }

    /// Free-text term, trimmed and stripped of `%` and `_`
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn company_ids(&self) -> &[i64] {
        &self.company_ids
    }

    #[must_use]
    pub fn department_ids(&self) -> &[i64] {
        &self.department_ids
    }

    #[must_use]
    pub fn position_ids(&self) -> &[i64] {
        &self.position_ids
    }

    /// Partial-match location terms
    #[must_use]
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Exact status values
    #[must_use]
    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// `(page - 1) * limit`; bounded at construction
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl TryFrom<&Value> for SearchFilter {
    type Error = ValidationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(params) => Self::from_params(params),
            Value::Null => Ok(Self::default()),
            _ => Err(ValidationError::new(
                "body",
                "request body must be a JSON object",
            )),
        }
    }
}

/// A key counts as absent when missing or explicitly `null`
fn present<'a>(params: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    params.get(field).filter(|value| !value.is_null())
}

/// Strip LIKE wildcard characters so user input can't widen the pattern.
#[must_use]
pub fn sanitize_like_term(term: &str) -> String {
    term.trim()
        .chars()
        .filter(|c| !matches!(c, '%' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Strict integer coercion: JSON integers and integer strings only.
///
/// Booleans, floats (even `10.0`) and anything non-numeric are rejected.
fn coerce_int_strict(value: &Value, field: &str) -> Result<i64, ValidationError> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ValidationError::not_an_integer(field))
}

fn positive_int_list(
    params: &Map<String, Value>,
    field: &str,
) -> Result<Vec<i64>, ValidationError> {
    let items = match present(params, field) {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Object(_)) => {
            return Err(ValidationError::new(
                field,
                format!("{field} must be a list of positive integers or a single integer"),
            ));
        }
        Some(scalar) => std::slice::from_ref(scalar),
    };

    items
        .iter()
        .map(|item| {
            let id = coerce_int_strict(item, field)?;
            if id <= 0 {
                return Err(ValidationError::new(
                    field,
                    format!("{field} values must be positive integers"),
                ));
            }
            Ok(id)
        })
        .collect()
}

fn string_list(params: &Map<String, Value>, field: &str) -> Result<Vec<String>, ValidationError> {
    let wrong_type = || {
        ValidationError::new(field, format!("{field} must be a string or list of strings"))
    };
    let trimmed = |text: &str| {
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    };

    match present(params, field) {
        None => Ok(Vec::new()),
        Some(Value::String(text)) => Ok(trimmed(text).into_iter().collect()),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => trimmed(text).map(Ok),
                _ => Some(Err(wrong_type())),
            })
            .collect(),
        Some(_) => Err(wrong_type()),
    }
}
