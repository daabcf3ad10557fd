//! Database connection management

use std::{num::TryFromIntError, time::Duration};

use sqlx::{PgPool, Postgres, Transaction, error::DatabaseError, migrate::MigrateError, query};
use thiserror::Error;

/// Isolation used for checkout units of work.
pub const SET_REPEATABLE_READ_SQL: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ";

/// SQL used to bound every statement inside a unit of work.
pub const SET_STATEMENT_TIMEOUT_SQL: &str = "SELECT set_config('statement_timeout', $1, true)";

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const QUERY_CANCELED: &str = "57014";

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a plain read-committed transaction.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction fails.
    pub async fn begin_transaction(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Begin a repeatable-read transaction whose statements time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or configuring it fails.
    pub async fn begin_unit_of_work(
        &self,
        timeout: Duration,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_REPEATABLE_READ_SQL).execute(&mut *tx).await?;

        query(SET_STATEMENT_TIMEOUT_SQL)
            .bind(format!("{}ms", timeout.as_millis()))
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Apply the bundled schema migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Whether retrying the whole unit of work may succeed.
pub(crate) fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE | QUERY_CANCELED)
        ),
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        _ => false,
    }
}

/// Whether `error` is a violation of the named constraint.
pub(crate) fn violates_constraint(error: &sqlx::Error, constraint: &str) -> bool {
    error
        .as_database_error()
        .and_then(DatabaseError::constraint)
        .is_some_and(|name| name == constraint)
}

/// Convert a stored `BIGINT` amount to minor units.
pub(crate) fn amount_from_db(value: i64, column: &str) -> Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// A value too large for the column it is written to.
#[derive(Debug, Error)]
#[error("{column} is out of range for storage")]
pub(crate) struct OutOfRange {
    column: String,
    #[source]
    source: TryFromIntError,
}

fn encode_error(column: &str, source: TryFromIntError) -> sqlx::Error {
    sqlx::Error::Encode(Box::new(OutOfRange {
        column: column.to_string(),
        source,
    }))
}

/// Convert minor units to a `BIGINT` for storage.
pub(crate) fn amount_to_db(value: u64, column: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| encode_error(column, e))
}

/// Convert a stored `INTEGER` quantity.
pub(crate) fn quantity_from_db(value: i32, column: &str) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Convert a quantity to an `INTEGER` for storage.
pub(crate) fn quantity_to_db(value: u32, column: &str) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| encode_error(column, e))
}
