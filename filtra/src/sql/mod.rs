//! SQL abstraction layer for multi-database support
//!
//! This module compiles filters and queries into parameterized SQL for
//! different database backends (Generic, SQLite, MySQL, PostgreSQL,
//! ClickHouse) and runs repository operations through an [`Executor`].

mod builder;
mod clickhouse_dialect;
mod compiler;
mod dialect;
mod generic_dialect;
mod mysql_dialect;
mod postgres_dialect;
mod repository;
mod sqlite_dialect;

pub use builder::{SqlBuilder, Statement};
pub use clickhouse_dialect::ClickhouseDialect;
pub use compiler::{Statements, compile_filter, compile_query};
pub use dialect::{DialectKind, SqlDialect, binary_comparison, comparison_operator, ilike};
pub use generic_dialect::GenericDialect;
pub use mysql_dialect::MysqlDialect;
pub use postgres_dialect::PostgresDialect;
pub use repository::{Executor, HookFn, SqlRepo};
pub use sqlite_dialect::SqliteDialect;
