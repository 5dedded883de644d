#![allow(dead_code)]

use hrsearch::entities::{column_configuration, company, department, employee, position};
use hrsearch::{AppState, RateLimitConfig, RateLimiter, SearchEngine, TextMatch};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
    Set,
};
use sea_orm_migration::prelude::*;
use std::sync::Arc;

/// Ids of the seeded employees, in insertion order
pub mod ids {
    pub const JOHN_DOE: i64 = 1;
    pub const JANE_SMITH: i64 = 2;
    pub const MIKE_JOHNSON: i64 = 3;
    pub const SARAH_WILLIAMS: i64 = 4;
    pub const ROBERT_BROWN: i64 = 5;
    pub const EMILY_DAVIS: i64 = 6;
    pub const DAVID_MILLER: i64 = 7;
    pub const JOHN_SMITH: i64 = 8;
    pub const JOSE_GARCIA: i64 = 9;
    pub const WANG_WEI: i64 = 10;
    pub const ALEXEI_IVANOV: i64 = 11;
    pub const MOHAMMED_ALI: i64 = 12;
    pub const ROBERT_INJECTION: i64 = 13;
    pub const JANE_SMITH_HEALTH: i64 = 14;
}

pub const TOTAL_EMPLOYEES: u64 = 14;
pub const ACTIVE_EMPLOYEES: u64 = 11;

/// In-memory directory with the full-text index built.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = connect().await?;
    Migrator::up(&db, None).await?;
    seed(&db).await?;
    db.execute_unprepared("INSERT INTO employees_fts(employees_fts) VALUES('rebuild')")
        .await?;
    Ok(db)
}

/// In-memory directory without a full-text index.
pub async fn setup_test_db_without_fts() -> Result<DatabaseConnection, DbErr> {
    let db = connect().await?;
    Migrator::up(&db, Some(1)).await?;
    seed(&db).await?;
    Ok(db)
}

pub async fn setup_engine(text_match: TextMatch) -> SearchEngine {
    let db = setup_test_db().await.unwrap();
    SearchEngine::new(db, text_match)
}

pub async fn setup_test_app(requests: u32) -> axum::Router {
    let db = setup_test_db().await.unwrap();
    let state = AppState {
        engine: Arc::new(SearchEngine::new(db, TextMatch::FullText)),
        limiter: Arc::new(RateLimiter::new(&RateLimitConfig {
            requests,
            ..RateLimitConfig::default()
        })),
        trust_forwarded_for: true,
    };
    hrsearch::router(state)
}

async fn connect() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    // one connection keeps the in-memory database alive and shared
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(options).await
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateDirectoryTables), Box::new(CreateFulltextIndex)]
    }
}

pub struct CreateDirectoryTables;

#[async_trait::async_trait]
impl MigrationName for CreateDirectoryTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_directory_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateDirectoryTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(schema.create_table_from_entity(company::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(department::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(position::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(employee::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(column_configuration::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "column_configurations",
            "employees",
            "positions",
            "departments",
            "companies",
        ] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}

pub struct CreateFulltextIndex;

#[async_trait::async_trait]
impl MigrationName for CreateFulltextIndex {
    fn name(&self) -> &'static str {
        "m20240101_000002_create_employees_fts"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateFulltextIndex {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE VIRTUAL TABLE IF NOT EXISTS employees_fts USING fts5(
                    first_name, last_name, email,
                    content='employees',
                    content_rowid='id'
                )",
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS employees_fts")
            .await?;
        Ok(())
    }
}

struct Person {
    company_id: i32,
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    department_id: Option<i32>,
    position_id: Option<i32>,
    location: &'static str,
    phone: &'static str,
    status: &'static str,
}

#[allow(clippy::too_many_arguments)]
const fn person(
    company_id: i32,
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    department_id: Option<i32>,
    position_id: Option<i32>,
    location: &'static str,
    phone: &'static str,
    status: &'static str,
) -> Person {
    Person {
        company_id,
        first_name,
        last_name,
        email,
        department_id,
        position_id,
        location,
        phone,
        status,
    }
}

async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    for name in ["Tech Corp", "Health Inc", "Finance Ltd"] {
        company::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    for (company_id, name) in [
        (1, "Engineering"),
        (1, "HR"),
        (2, "Medical"),
        (2, "Nursing"),
        (3, "Accounting"),
        (3, "Finance"),
    ] {
        department::ActiveModel {
            company_id: Set(company_id),
            name: Set(name.to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    for (company_id, title) in [
        (1, "Senior Developer"),
        (1, "DevOps Engineer"),
        (1, "HR Manager"),
        (2, "Doctor"),
        (2, "Head Nurse"),
        (3, "Senior Accountant"),
        (3, "Financial Analyst"),
    ] {
        position::ActiveModel {
            company_id: Set(company_id),
            title: Set(title.to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    let people = [
        person(
            1,
            "John",
            "Doe",
            "john@techcorp.com",
            Some(1),
            Some(1),
            "New York, NY",
            "555-0101",
            "Active",
        ),
        person(
            1,
            "Jane",
            "Smith",
            "jane@techcorp.com",
            Some(1),
            Some(2),
            "San Francisco, CA",
            "555-0102",
            "Active",
        ),
        person(
            1,
            "Mike",
            "Johnson",
            "mike@techcorp.com",
            Some(2),
            Some(3),
            "New York, NY",
            "555-0103",
            "Active",
        ),
        person(
            2,
            "Sarah",
            "Williams",
            "sarah@healthinc.com",
            Some(3),
            Some(4),
            "Boston, MA",
            "555-0201",
            "Active",
        ),
        person(
            2,
            "Robert",
            "Brown",
            "robert@healthinc.com",
            Some(4),
            Some(5),
            "Boston, MA",
            "555-0202",
            "Not started",
        ),
        person(
            3,
            "Emily",
            "Davis",
            "emily@financeltd.com",
            Some(5),
            Some(6),
            "Chicago, IL",
            "555-0301",
            "Active",
        ),
        person(
            3,
            "David",
            "Miller",
            "david@financeltd.com",
            Some(6),
            Some(7),
            "Chicago, IL",
            "555-0302",
            "Terminated",
        ),
        person(
            1,
            "John",
            "Smith",
            "john.smith@techcorp.com",
            Some(1),
            Some(1),
            "New York, NY",
            "555-0104",
            "Terminated",
        ),
        person(
            1,
            "José",
            "García",
            "jose@techcorp.com",
            None,
            None,
            "São Paulo",
            "555-0105",
            "Active",
        ),
        person(
            2,
            "伟",
            "王",
            "wei@healthinc.com",
            None,
            None,
            "北京",
            "555-0203",
            "Active",
        ),
        person(
            3,
            "Алексей",
            "Иванов",
            "alexei@financeltd.com",
            None,
            None,
            "Москва",
            "555-0303",
            "Active",
        ),
        person(
            1,
            "محمد",
            "علي",
            "m.ali@techcorp.com",
            None,
            None,
            "دبي",
            "555-0106",
            "Active",
        ),
        person(
            1,
            "Robert'; DROP TABLE employees; --",
            "Smith",
            "robert.smith@test.com",
            Some(1),
            Some(1),
            "New York, NY",
            "555-0001",
            "Active",
        ),
        person(
            2,
            "Jane",
            "Smith",
            "jane.smith@healthinc.com",
            Some(3),
            Some(4),
            "Boston, MA",
            "555-0204",
            "Active",
        ),
    ];

    for p in people {
        employee::ActiveModel {
            company_id: Set(p.company_id),
            first_name: Set(p.first_name.to_owned()),
            last_name: Set(p.last_name.to_owned()),
            email: Set(Some(p.email.to_owned())),
            department_id: Set(p.department_id),
            position_id: Set(p.position_id),
            location: Set(Some(p.location.to_owned())),
            phone: Set(Some(p.phone.to_owned())),
            status: Set(Some(p.status.to_owned())),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    // phone is configured but hidden
    for ((column, visible), order) in [
        ("first_name", true),
        ("last_name", true),
        ("email", true),
        ("department", true),
        ("position", true),
        ("location", true),
        ("phone", false),
        ("status", true),
    ]
    .into_iter()
    .zip(0_i32..)
    {
        column_configuration::ActiveModel {
            column_name: Set(column.to_owned()),
            is_visible: Set(visible),
            display_order: Set(order),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
