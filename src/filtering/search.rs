use sea_orm::{
    ConnectionTrait, Condition, DatabaseBackend, DbErr, Statement,
    sea_query::{Alias, Expr, Func, LikeExpr, Query, SimpleExpr},
};
use serde::Deserialize;

use crate::entities::employee;

/// External-content FTS5 table over `(first_name, last_name, email)`, keyed by
/// the employee id as rowid
pub const FULLTEXT_TABLE: &str = "employees_fts";

/// How the free-text term is matched against names and email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Prefix matching through the full-text index
    FullText,
    /// Case-insensitive substring matching on each column, OR-ed together
    Substring,
}

/// Configured text-search strategy; `Auto` is resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSearchMode {
    #[default]
    Auto,
    FullText,
    Substring,
}

impl TextSearchMode {
    /// Pick the concrete strategy, probing the storage for `Auto`.
    ///
    /// # Errors
    ///
    /// Propagates the storage error if the probe query fails.
    pub async fn resolve<C: ConnectionTrait>(self, db: &C) -> Result<TextMatch, DbErr> {
        match self {
            Self::FullText => Ok(TextMatch::FullText),
            Self::Substring => Ok(TextMatch::Substring),
            Self::Auto => Ok(if fulltext_available(db).await? {
                TextMatch::FullText
            } else {
                TextMatch::Substring
            }),
        }
    }
}

/// Whether the full-text table exists. Only SQLite FTS5 is supported.
///
/// # Errors
///
/// Propagates the storage error if the catalog query fails.
pub async fn fulltext_available<C: ConnectionTrait>(db: &C) -> Result<bool, DbErr> {
    let backend = db.get_database_backend();
    if backend != DatabaseBackend::Sqlite {
        return Ok(false);
    }

    let probe = Statement::from_sql_and_values(
        backend,
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        [FULLTEXT_TABLE.into()],
    );
    Ok(db.query_one(probe).await?.is_some())
}

/// Escape LIKE wildcards (`%`, `_`) and the escape character itself.
fn escape_like_wildcards(input: &str) -> String {
    // backslash first
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build an FTS5 query where every whitespace-separated term is a quoted
/// prefix token. Terms without a letter or digit produce no index token and
/// are skipped. Returns `None` when no term is left.
#[must_use]
pub fn fulltext_match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|term| term.chars().any(char::is_alphanumeric))
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect();

    (!terms.is_empty()).then(|| terms.join(" "))
}

/// Case-insensitive `column LIKE %needle%`, with the needle bound as a
/// parameter and its wildcards escaped.
///
/// SQLite and `MySQL` already compare case-insensitively through `LIKE`; on
/// `PostgreSQL` both sides are lowered.
#[must_use]
pub fn build_contains_condition(
    column: employee::Column,
    needle: &str,
    backend: DatabaseBackend,
) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like_wildcards(needle));
    let column = Expr::col((employee::Entity, column));

    match backend {
        DatabaseBackend::Postgres => Expr::expr(Func::lower(column))
            .like(LikeExpr::new(pattern.to_lowercase()).escape('\\')),
        _ => column.like(LikeExpr::new(pattern).escape('\\')),
    }
}

/// Build the text-search clause for a non-empty term.
#[must_use]
pub fn build_text_condition(
    query: &str,
    strategy: TextMatch,
    backend: DatabaseBackend,
) -> Option<Condition> {
    if query.is_empty() {
        return None;
    }

    match strategy {
        // punctuation-only terms can't be found through the index
        TextMatch::FullText if backend == DatabaseBackend::Sqlite => Some(
            build_fulltext_condition(query)
                .unwrap_or_else(|| build_substring_condition(query, backend)),
        ),
        // FTS5 syntax is SQLite-only
        TextMatch::FullText | TextMatch::Substring => {
            Some(build_substring_condition(query, backend))
        }
    }
}

fn build_fulltext_condition(query: &str) -> Option<Condition> {
    let match_expression = fulltext_match_expression(query)?;

    let matching_ids = Query::select()
        .column(Alias::new("rowid"))
        .from(Alias::new(FULLTEXT_TABLE))
        .and_where(Expr::cust_with_values(
            format!("{FULLTEXT_TABLE} MATCH ?"),
            [match_expression],
        ))
        .to_owned();

    Some(
        Condition::all().add(
            Expr::col((employee::Entity, employee::Column::Id)).in_subquery(matching_ids),
        ),
    )
}

fn build_substring_condition(query: &str, backend: DatabaseBackend) -> Condition {
    [
        employee::Column::FirstName,
        employee::Column::LastName,
        employee::Column::Email,
    ]
    .into_iter()
    .fold(Condition::any(), |any, column| {
        any.add(build_contains_condition(column, query, backend))
    })
}
