//! Repository trait shared by every backend
//!
//! A repository turns [`Filter`]s and [`Query`]s into record reads and writes
//! for one entity type. The database handle is passed per call so that the
//! same repository works both on a database and inside a transaction.

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::Filter;
use crate::query::Query;

/// Repository trait for records of type `T`
///
/// Implemented by the in-memory backend ([`MemoryRepo`](crate::MemoryRepo))
/// and the SQL backend ([`SqlRepo`](crate::SqlRepo)). Both must return the
/// same records for the same filters.
#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Database handle the repository operates on
    type Db: ?Sized + Send + Sync;

    // ==================== Reads ====================

    /// First record matching the filter, or `NotFound`
    async fn get(&self, db: &Self::Db, filter: &Filter) -> Result<T>;

    /// Like `get`, locking the row until the surrounding transaction ends
    /// where the backend supports it
    async fn get_for_update(&self, db: &Self::Db, filter: &Filter) -> Result<T>;

    async fn exists(&self, db: &Self::Db, filter: &Filter) -> Result<bool>;

    async fn count(&self, db: &Self::Db, filter: &Filter) -> Result<u64>;

    async fn count_all(&self, db: &Self::Db) -> Result<u64>;

    /// Records matching the query, ordered and paginated
    async fn get_many(&self, db: &Self::Db, query: &Query) -> Result<Vec<T>>;

    /// First record of the query result, or `NotFound`
    async fn get_first(&self, db: &Self::Db, query: &Query) -> Result<T>;

    // ==================== Writes ====================

    async fn add(&self, db: &Self::Db, record: &T) -> Result<()>;

    async fn add_many(&self, db: &Self::Db, records: &[T]) -> Result<()>;

    /// Overwrite every record matching the filter with `record`
    async fn update(&self, db: &Self::Db, filter: &Filter, record: &T) -> Result<()>;

    async fn delete(&self, db: &Self::Db, filter: &Filter) -> Result<()>;

    /// Remove every record
    async fn clear(&self, db: &Self::Db) -> Result<()>;
}
