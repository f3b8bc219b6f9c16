//! Database primitives and the employee directory queries.

pub mod directory;

use chrono::Utc;
use entity::employees;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseBackend,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Shared Postgres pool alias.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing (set {0})")]
    MissingUrl(String),
    #[error("invalid employee id {0}")]
    InvalidId(String),
    #[error(transparent)]
    Query(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

/// Environment-driven connection settings.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_url_key")]
    env_key: String,
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

fn default_url_key() -> String {
    "DATABASE_URL".to_string()
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            env_key: default_url_key(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    pub fn new(env_key: impl Into<String>) -> Self {
        Self {
            env_key: env_key.into(),
            ..Self::default()
        }
    }

    /// `DATABASE_URL`, with the pool size taken from `DATABASE_MAX_CONNECTIONS`
    /// when it parses.
    pub fn from_env() -> Self {
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(default_max_connections);
        Self {
            max_connections,
            ..Self::default()
        }
    }

    pub fn database_url(&self) -> DbResult<String> {
        std::env::var(&self.env_key).map_err(|_| DbError::MissingUrl(self.env_key.clone()))
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let url = settings.database_url()?;
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(settings.max_connections)
        .sqlx_logging(false);
    let pool = Database::connect(options).await?;
    debug!(max_connections = settings.max_connections, "database pool ready");
    Ok(pool)
}

pub async fn ping(pool: &DbPool) -> bool {
    pool.execute(Statement::from_string(
        DatabaseBackend::Postgres,
        "SELECT 1".to_string(),
    ))
    .await
    .is_ok()
}

/// Row to insert into the directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewEmployee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub manager_id: Option<Uuid>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Writes produced by committing an org chart edit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryChanges {
    /// `(employee, new manager)` pairs.
    pub reassigned: Vec<(Uuid, Option<Uuid>)>,
    pub hired: Vec<NewEmployee>,
    pub removed: Vec<Uuid>,
}

impl DirectoryChanges {
    pub fn is_empty(&self) -> bool {
        self.reassigned.is_empty() && self.hired.is_empty() && self.removed.is_empty()
    }
}

/// Whole directory, oldest employees first.
pub async fn list_employees<C: ConnectionTrait>(conn: &C) -> DbResult<Vec<employees::Model>> {
    let rows = employees::Entity::find()
        .order_by_asc(employees::Column::CreatedAt)
        .order_by_asc(employees::Column::Id)
        .all(conn)
        .await?;
    Ok(rows)
}

pub async fn insert_employee<C: ConnectionTrait>(conn: &C, employee: NewEmployee) -> DbResult<()> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let model = employees::ActiveModel {
        id: Set(employee.id),
        first_name: Set(employee.first_name),
        last_name: Set(employee.last_name),
        manager_id: Set(employee.manager_id),
        position: Set(employee.position),
        department: Set(employee.department),
        email: Set(employee.email),
        phone: Set(employee.phone),
        created_at: Set(now),
        updated_at: Set(now),
    };
    employees::Entity::insert(model)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Apply all changes in one transaction; nothing is written if any step fails.
pub async fn apply_directory_changes(pool: &DbPool, changes: DirectoryChanges) -> DbResult<()> {
    if changes.is_empty() {
        return Ok(());
    }
    let reassigned = changes.reassigned.len();
    let hired = changes.hired.len();
    let removed = changes.removed.len();

    let txn = pool.begin().await?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    for (employee_id, manager_id) in changes.reassigned {
        employees::Entity::update_many()
            .col_expr(employees::Column::ManagerId, Expr::value(manager_id))
            .col_expr(employees::Column::UpdatedAt, Expr::value(now))
            .filter(employees::Column::Id.eq(employee_id))
            .exec(&txn)
            .await?;
    }
    for employee in changes.hired {
        insert_employee(&txn, employee).await?;
    }
    if !changes.removed.is_empty() {
        employees::Entity::delete_many()
            .filter(employees::Column::Id.is_in(changes.removed))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;

    info!(reassigned, hired, removed, "employee directory updated");
    Ok(())
}

pub fn parse_employee_id(raw: &str) -> DbResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DbError::InvalidId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{MockDatabase, MockExecResult};

    fn employee(first_name: &str, manager_id: Option<Uuid>) -> employees::Model {
        let now: DateTimeWithTimeZone = Utc::now().into();
        employees::Model {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: "Muster".to_string(),
            manager_id,
            position: None,
            department: Some("Sales".to_string()),
            email: None,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn missing_url_names_the_variable() {
        let settings = DatabaseSettings::new("ORGCHART_TEST_URL_THAT_IS_NOT_SET");
        let err = settings.database_url().unwrap_err();
        assert_eq!(
            err.to_string(),
            "database url missing (set ORGCHART_TEST_URL_THAT_IS_NOT_SET)"
        );
    }

    #[test]
    fn employee_ids_must_be_uuids() {
        assert!(matches!(
            parse_employee_id("not-a-uuid"),
            Err(DbError::InvalidId(_))
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_employee_id(&id.to_string()).unwrap(), id);
    }

    #[tokio::test]
    async fn lists_directory_rows() {
        let boss = employee("Anna", None);
        let report = employee("Luca", Some(boss.id));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![boss.clone(), report.clone()]])
            .into_connection();
        let rows = list_employees(&db).await.unwrap();
        assert_eq!(rows, vec![boss, report]);
    }

    #[tokio::test]
    async fn applies_changes_in_one_transaction() {
        let exec = || MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(), exec(), exec()])
            .into_connection();
        let changes = DirectoryChanges {
            reassigned: vec![(Uuid::new_v4(), Some(Uuid::new_v4()))],
            hired: vec![NewEmployee {
                id: Uuid::new_v4(),
                first_name: "Eva".into(),
                last_name: "Roth".into(),
                ..NewEmployee::default()
            }],
            removed: vec![Uuid::new_v4()],
        };
        apply_directory_changes(&db, changes).await.unwrap();
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn empty_changes_skip_the_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        apply_directory_changes(&db, DirectoryChanges::default())
            .await
            .unwrap();
        assert!(db.into_transaction_log().is_empty());
    }
}
