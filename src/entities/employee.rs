use sea_orm::entity::prelude::*;

/// A directory entry. `id` is the stable identifier used as the final
/// ordering tie-break and as the full-text index rowid.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub department_id: Option<i32>,
    pub position_id: Option<i32>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::position::Entity",
        from = "Column::PositionId",
        to = "super::position::Column::Id"
    )]
    Position,
}

impl ActiveModelBehavior for ActiveModel {}

/// Columns that may be projected straight from the `employees` table when
/// marked visible. Anything else in the column configuration is either a
/// joined dimension or ignored.
#[must_use]
pub fn projectable_column(name: &str) -> Option<Column> {
    match name {
        "first_name" => Some(Column::FirstName),
        "last_name" => Some(Column::LastName),
        "email" => Some(Column::Email),
        "location" => Some(Column::Location),
        "phone" => Some(Column::Phone),
        "status" => Some(Column::Status),
        "company_id" => Some(Column::CompanyId),
        _ => None,
    }
}
