//! # filtra
//!
//! **Portable filters**: build a query once, run it against SQL or memory.
//!
//! A [`Filter`] describes a predicate over named entity fields. It can be
//! compiled into parameterized SQL for Generic, SQLite, MySQL, PostgreSQL and
//! ClickHouse dialects, or evaluated directly against in-process rows. Both
//! paths agree on null handling, case sensitivity, substring matching,
//! subnet containment and numeric equality.
//!
//! ## Quick Start
//!
//! ```
//! use filtra::filter::{and, eq, gte};
//! use filtra::mapping::Mapping;
//! use filtra::sql::{SqliteDialect, compile_filter};
//!
//! let mapping = Mapping::new([("name", "user_name"), ("age", "user_age")]).unwrap();
//! let filter = and([eq("name", "Bob"), gte("age", 18)]);
//! let statement = compile_filter(&SqliteDialect, &mapping, &filter).unwrap();
//! assert_eq!(statement.sql, "(user_name = ?) AND (user_age >= ?)");
//! ```

pub mod error;
pub mod filter;
pub mod mapping;
pub mod memory;
pub mod query;
pub mod repository;
pub mod sql;
pub mod sqlite;
pub mod utils;

pub use error::{Error, Result};
pub use filter::{Filter, Operation, Value};
pub use mapping::{ColumnMap, Entity, Mapper, Mapping};
pub use memory::{Evaluator, MemoryDb, MemoryRepo};
pub use query::{Order, Query, asc, desc};
pub use repository::Repository;
pub use sql::{DialectKind, Executor, SqlDialect, SqlRepo, Statement};
pub use sqlite::SqliteExecutor;
