//! The search query engine.
//!
//! One call to [`SearchEngine::search`] resolves the visible columns, then runs
//! a `COUNT` and a page query with the same predicate inside one transaction.
//! Either both succeed or the whole search fails.

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, TransactionTrait,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::columns::{ColumnConfiguration, ColumnResolver};
use crate::entities::{department, employee, position};
use crate::errors::SearchError;
use crate::filtering::{Pagination, SearchFilter, TextMatch, build_search_condition};

/// Projected key for the joined department name
pub const DEPARTMENT_COLUMN: &str = "department";
/// Projected key for the joined position title
pub const POSITION_COLUMN: &str = "position";

/// One employee, keyed by projected column in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmployeeRecord(pub Map<String, Value>);

impl EmployeeRecord {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Projected keys in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub employees: Vec<EmployeeRecord>,
    pub pagination: Pagination,
}

/// Stateless per request; the only shared state is the column snapshot.
pub struct SearchEngine {
    db: DatabaseConnection,
    columns: ColumnResolver<DatabaseConnection>,
    text_match: TextMatch,
}

impl SearchEngine {
    /// `text_match` is downgraded to substring matching on backends without
    /// FTS5.
    #[must_use]
    pub fn new(db: DatabaseConnection, text_match: TextMatch) -> Self {
        let backend = db.get_database_backend();
        let text_match = if text_match == TextMatch::FullText
            && backend != sea_orm::DatabaseBackend::Sqlite
        {
            tracing::warn!(
                ?backend,
                "full-text search requires SQLite FTS5; using substring matching"
            );
            TextMatch::Substring
        } else {
            text_match
        };

        Self {
            columns: ColumnResolver::new(db.clone()),
            db,
            text_match,
        }
    }

    #[must_use]
    pub const fn text_match(&self) -> TextMatch {
        self.text_match
    }

    /// The column resolver backing the projection
    #[must_use]
    pub const fn columns(&self) -> &ColumnResolver<DatabaseConnection> {
        &self.columns
    }

    /// Run a search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Storage`] if the column lookup, the count or the
    /// page query fails. No partial result is returned.
    pub async fn search(&self, filter: &SearchFilter) -> Result<SearchResult, SearchError> {
        // resolved before the transaction opens; a single-connection pool
        // can't serve both at once
        let columns = self.columns.resolve().await?;

        let backend = self.db.get_database_backend();
        let condition = build_search_condition(filter, self.text_match, backend);
        tracing::debug!(?filter, text_match = ?self.text_match, "searching employees");

        let txn = self.db.begin().await?;

        let total = employee::Entity::find()
            .filter(condition.clone())
            .count(&txn)
            .await?;

        let rows = project(employee::Entity::find(), &columns)
            .filter(condition)
            .order_by_asc(employee::Column::LastName)
            .order_by_asc(employee::Column::FirstName)
            .order_by_asc(employee::Column::Id)
            .limit(filter.limit())
            .offset(filter.offset())
            .into_json()
            .all(&txn)
            .await?;

        txn.commit().await?;

        let employees = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(EmployeeRecord(map)),
                other => Err(DbErr::Type(format!("expected a row object, got {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pagination = Pagination::new(total, filter.limit(), filter.offset());
        tracing::debug!(
            total,
            returned = employees.len(),
            has_more = pagination.has_more,
            "search complete"
        );

        Ok(SearchResult {
            employees,
            pagination,
        })
    }
}

/// Select `id` and then every visible column in display order. Joined
/// dimensions are added through LEFT JOINs only when visible.
fn project(
    select: Select<employee::Entity>,
    columns: &[ColumnConfiguration],
) -> Select<employee::Entity> {
    let mut select = select.select_only().column(employee::Column::Id);
    let mut department_joined = false;
    let mut position_joined = false;

    for column in columns {
        match column.column_name.as_str() {
            DEPARTMENT_COLUMN if !department_joined => {
                select = select
                    .join(JoinType::LeftJoin, employee::Relation::Department.def())
                    .column_as(department::Column::Name, DEPARTMENT_COLUMN);
                department_joined = true;
            }
            POSITION_COLUMN if !position_joined => {
                select = select
                    .join(JoinType::LeftJoin, employee::Relation::Position.def())
                    .column_as(position::Column::Title, POSITION_COLUMN);
                position_joined = true;
            }
            name => {
                if let Some(column) = employee::projectable_column(name) {
                    select = select.column(column);
                }
            }
        }
    }

    select
}
