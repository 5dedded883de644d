//! Column visibility, resolved once per process.
//!
//! The first successful [`ColumnResolver::resolve`] call reads
//! `column_configurations` and stores an immutable snapshot; later calls read
//! that snapshot without locking. Concurrent first callers share a single
//! storage read. A failed read leaves the cache empty so the next call retries.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::entities::column_configuration;

/// One configurable field of the employee projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnConfiguration {
    pub column_name: String,
    pub is_visible: bool,
    pub display_order: i32,
}

impl From<column_configuration::Model> for ColumnConfiguration {
    fn from(model: column_configuration::Model) -> Self {
        Self {
            column_name: model.column_name,
            is_visible: model.is_visible,
            display_order: model.display_order,
        }
    }
}

/// Where visible column definitions are read from.
#[async_trait]
pub trait ColumnSource: Send + Sync {
    /// Visible columns, ascending by `display_order`
    async fn visible_columns(&self) -> Result<Vec<ColumnConfiguration>, DbErr>;
}

#[async_trait]
impl ColumnSource for DatabaseConnection {
    async fn visible_columns(&self) -> Result<Vec<ColumnConfiguration>, DbErr> {
        let rows = column_configuration::Entity::find()
            .filter(column_configuration::Column::IsVisible.eq(true))
            .order_by_asc(column_configuration::Column::DisplayOrder)
            .order_by_asc(column_configuration::Column::ColumnName)
            .all(self)
            .await?;

        Ok(rows.into_iter().map(ColumnConfiguration::from).collect())
    }
}

/// Memoized column configuration
pub struct ColumnResolver<S = DatabaseConnection> {
    source: S,
    snapshot: OnceCell<Arc<[ColumnConfiguration]>>,
}

impl<S: ColumnSource> ColumnResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshot: OnceCell::new(),
        }
    }

    /// Visible columns sorted by `display_order`.
    ///
    /// # Errors
    ///
    /// Returns the storage error of a failed first read. Nothing is cached in
    /// that case.
    pub async fn resolve(&self) -> Result<Arc<[ColumnConfiguration]>, DbErr> {
        self.snapshot
            .get_or_try_init(|| async {
                let mut columns = self.source.visible_columns().await?;
                // the snapshot holds visible rows only, ascending by display_order
                columns.retain(|column| column.is_visible);
                columns.sort_by_key(|column| column.display_order);
                tracing::debug!(count = columns.len(), "column configuration cached");
                Ok::<_, DbErr>(Arc::from(columns))
            })
            .await
            .cloned()
    }

    /// The cached snapshot, if resolution already succeeded
    pub fn cached(&self) -> Option<Arc<[ColumnConfiguration]>> {
        self.snapshot.get().cloned()
    }
}
