use sea_orm::{ColumnTrait, Condition, DatabaseBackend};

use super::normalize::SearchFilter;
use super::search::{TextMatch, build_contains_condition, build_text_condition};
use crate::entities::employee;

/// `column IN (...)` for a non-empty id list
fn ids_clause(column: employee::Column, ids: &[i64]) -> Option<Condition> {
    (!ids.is_empty()).then(|| Condition::all().add(column.is_in(ids.iter().copied())))
}

/// Any of the locations may match as a substring ("York" finds "New York, NY")
fn locations_clause(locations: &[String], backend: DatabaseBackend) -> Option<Condition> {
    (!locations.is_empty()).then(|| {
        locations.iter().fold(Condition::any(), |any, location| {
            any.add(build_contains_condition(
                employee::Column::Location,
                location,
                backend,
            ))
        })
    })
}

/// Statuses match exactly, unlike locations
fn statuses_clause(statuses: &[String]) -> Option<Condition> {
    (!statuses.is_empty())
        .then(|| Condition::all().add(employee::Column::Status.is_in(statuses.iter().cloned())))
}

/// Build the WHERE predicate shared by the count and page queries.
///
/// Each active filter contributes one clause with bound parameters; inactive
/// filters contribute nothing, so any subset of filters composes by AND. With
/// no active filter the condition is empty and matches every row.
#[must_use]
pub fn build_search_condition(
    filter: &SearchFilter,
    text_match: TextMatch,
    backend: DatabaseBackend,
) -> Condition {
    [
        build_text_condition(filter.query(), text_match, backend),
        ids_clause(employee::Column::CompanyId, filter.company_ids()),
        ids_clause(employee::Column::DepartmentId, filter.department_ids()),
        ids_clause(employee::Column::PositionId, filter.position_ids()),
        locations_clause(filter.locations(), backend),
        statuses_clause(filter.statuses()),
    ]
    .into_iter()
    .flatten()
    .fold(Condition::all(), Condition::add)
}
