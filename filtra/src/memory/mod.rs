//! In-memory backend
//!
//! The [`Evaluator`] applies filters and queries to column maps with SQL
//! semantics. [`MemoryRepo`] builds the repository contract on top of it and
//! serves as the oracle every SQL dialect is checked against.

mod evaluator;
mod repository;
mod store;

pub use evaluator::Evaluator;
pub use repository::MemoryRepo;
pub use store::{MemoryDb, Tables};
