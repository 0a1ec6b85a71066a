//! SQLite executor
//!
//! Runs compiled statements on a `sqlx` SQLite pool. Connections are opened
//! with `case_sensitive_like` so that `LIKE` matches the way the compiler
//! and the in-memory evaluator expect.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, TypeInfo, ValueRef};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::filter::Value;
use crate::sql::{Executor, SqlDialect, SqliteDialect, Statement};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// [`Executor`] over a `sqlx` SQLite pool
#[derive(Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Wrap an existing pool
    ///
    /// The pool's connections should enable `PRAGMA case_sensitive_like`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a database URL such as `sqlite://data.db?mode=rwc`
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Config(format!("invalid SQLite URL `{}`: {}", url, e)))?
            .pragma("case_sensitive_like", "ON");
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| Error::driver(format!("connect {}", url), e))?;
        debug!(url, "SqliteExecutor connected");
        Ok(Self { pool })
    }

    /// Private in-memory database
    ///
    /// Every SQLite connection gets its own memory database, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::Config(e.to_string()))?
            .pragma("case_sensitive_like", "ON");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::driver("connect sqlite::memory:", e))?;
        debug!("SqliteExecutor opened in-memory database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("SQLite pool closed");
    }
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(x) => query.bind(*x),
        Value::Text(s) => query.bind(s.as_str()),
        // Compiled for another dialect; store the way SQLite statements bind it
        other => match SqliteDialect.bind_value(other.clone()) {
            Value::Text(s) => query.bind(s),
            converted => query.bind(converted.to_string()),
        },
    }
}

fn prepare(statement: &Statement) -> SqliteQuery<'_> {
    trace!(sql = %statement.sql, params = statement.params.len(), "Executing statement");
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), bind_value)
}

fn decode_row(row: &SqliteRow) -> Result<Vec<Value>, sqlx::Error> {
    (0..row.len()).map(|i| decode_column(row, i)).collect()
}

/// Decode by the storage class of the stored value, not the declared type
fn decode_column(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_info = raw.type_info();
    match type_info.name() {
        "INTEGER" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(index).map(Value::Int),
        "REAL" => row.try_get_unchecked::<f64, _>(index).map(Value::Float),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(|b| Value::Text(String::from_utf8_lossy(&b).into_owned())),
        _ => row.try_get_unchecked::<String, _>(index).map(Value::Text),
    }
}

#[async_trait]
impl Executor for SqliteExecutor {
    async fn execute(&self, statement: &Statement) -> Result<u64> {
        let result = prepare(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::driver(&statement.sql, e))?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Vec<Value>>> {
        let rows = prepare(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::driver(&statement.sql, e))?;
        rows.iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::driver(&statement.sql, e))
    }

    async fn fetch_optional(&self, statement: &Statement) -> Result<Option<Vec<Value>>> {
        let row = prepare(statement)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::driver(&statement.sql, e))?;
        row.as_ref()
            .map(decode_row)
            .transpose()
            .map_err(|e| Error::driver(&statement.sql, e))
    }
}
