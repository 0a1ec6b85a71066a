//! SQL-backed repository
//!
//! [`SqlRepo`] renders every repository operation with [`Statements`] and
//! hands the result to an [`Executor`], the seam to the actual driver.

use std::sync::Arc;

use async_trait::async_trait;

use super::builder::Statement;
use super::compiler::Statements;
use super::dialect::{DialectKind, SqlDialect};
use crate::error::{Error, Result};
use crate::filter::{Filter, FromValue, Value};
use crate::mapping::Mapper;
use crate::query::Query;
use crate::repository::Repository;

/// Runs statements against a database
///
/// Rows are returned as values in select order. Implementations wrap driver
/// failures with [`Error::driver`] so the statement text is kept.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a statement, returning the number of affected rows
    async fn execute(&self, statement: &Statement) -> Result<u64>;

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Vec<Value>>>;

    async fn fetch_optional(&self, statement: &Statement) -> Result<Option<Vec<Value>>>;
}

/// Statements run after a successful write of a record
pub type HookFn<T> = Arc<dyn Fn(&T) -> Result<Vec<Statement>> + Send + Sync>;

/// Repository over any SQL engine reachable through an [`Executor`]
pub struct SqlRepo<T> {
    mapper: Mapper<T>,
    dialect: Arc<dyn SqlDialect>,
    after_add: Option<HookFn<T>>,
    after_update: Option<HookFn<T>>,
}

impl<T> Clone for SqlRepo<T> {
    fn clone(&self) -> Self {
        Self {
            mapper: self.mapper.clone(),
            dialect: Arc::clone(&self.dialect),
            after_add: self.after_add.clone(),
            after_update: self.after_update.clone(),
        }
    }
}

impl<T> SqlRepo<T> {
    pub fn new(mapper: Mapper<T>, dialect: Arc<dyn SqlDialect>) -> Self {
        Self {
            mapper,
            dialect,
            after_add: None,
            after_update: None,
        }
    }

    pub fn with_kind(mapper: Mapper<T>, kind: DialectKind) -> Self {
        Self::new(mapper, Arc::from(kind.dialect()))
    }

    /// Statements to run after each added record
    pub fn after_add<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) -> Result<Vec<Statement>> + Send + Sync + 'static,
    {
        self.after_add = Some(Arc::new(hook));
        self
    }

    /// Statements to run after each update
    pub fn after_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) -> Result<Vec<Statement>> + Send + Sync + 'static,
    {
        self.after_update = Some(Arc::new(hook));
        self
    }

    pub fn mapper(&self) -> &Mapper<T> {
        &self.mapper
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    /// Renderer for this repository's statements
    pub fn statements(&self) -> Statements<'_> {
        Statements::for_mapper(self.dialect.as_ref(), &self.mapper)
    }

    async fn run_hook(
        &self,
        db: &dyn Executor,
        hook: Option<&HookFn<T>>,
        record: &T,
    ) -> Result<()> {
        if let Some(hook) = hook {
            for statement in hook(record)? {
                db.execute(&statement).await?;
            }
        }
        Ok(())
    }

    async fn load_one(&self, db: &dyn Executor, statement: &Statement) -> Result<T> {
        let row = db.fetch_optional(statement).await?.ok_or(Error::NotFound)?;
        self.mapper.load(&row)
    }
}

/// First column of a single-row result
fn scalar<V: FromValue>(row: Option<Vec<Value>>, name: &str) -> Result<V> {
    let value = row
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| Error::decode(name, V::EXPECTED, "nothing"))?;
    let found = value.type_name();
    V::from_value(value).ok_or_else(|| Error::decode(name, V::EXPECTED, found))
}

#[async_trait]
impl<T> Repository<T> for SqlRepo<T>
where
    T: Send + Sync + 'static,
{
    type Db = dyn Executor;

    async fn get(&self, db: &Self::Db, filter: &Filter) -> Result<T> {
        let statement = self.statements().select_one(filter)?;
        self.load_one(db, &statement).await
    }

    async fn get_for_update(&self, db: &Self::Db, filter: &Filter) -> Result<T> {
        let statement = self.statements().select_for_update(filter)?;
        self.load_one(db, &statement).await
    }

    async fn exists(&self, db: &Self::Db, filter: &Filter) -> Result<bool> {
        let statement = self.statements().exists(filter)?;
        scalar(db.fetch_optional(&statement).await?, "exists")
    }

    async fn count(&self, db: &Self::Db, filter: &Filter) -> Result<u64> {
        let statement = self.statements().count(filter)?;
        scalar(db.fetch_optional(&statement).await?, "count")
    }

    async fn count_all(&self, db: &Self::Db) -> Result<u64> {
        let statement = self.statements().count_all();
        scalar(db.fetch_optional(&statement).await?, "count")
    }

    async fn get_many(&self, db: &Self::Db, query: &Query) -> Result<Vec<T>> {
        let statement = self.statements().select_many(query)?;
        db.fetch_all(&statement)
            .await?
            .iter()
            .map(|row| self.mapper.load(row))
            .collect()
    }

    async fn get_first(&self, db: &Self::Db, query: &Query) -> Result<T> {
        let first = query.clone().with_limit(1);
        let statement = self.statements().select_many(&first)?;
        self.load_one(db, &statement).await
    }

    async fn add(&self, db: &Self::Db, record: &T) -> Result<()> {
        let row = self.mapper.dump(record)?;
        let statement = self.statements().insert(std::slice::from_ref(&row))?;
        db.execute(&statement).await?;
        self.run_hook(db, self.after_add.as_ref(), record).await
    }

    async fn add_many(&self, db: &Self::Db, records: &[T]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = records
            .iter()
            .map(|r| self.mapper.dump(r))
            .collect::<Result<Vec<_>>>()?;
        let statement = self.statements().insert(&rows)?;
        db.execute(&statement).await?;
        for record in records {
            self.run_hook(db, self.after_add.as_ref(), record).await?;
        }
        Ok(())
    }

    async fn update(&self, db: &Self::Db, filter: &Filter, record: &T) -> Result<()> {
        let row = self.mapper.dump(record)?;
        let statement = self.statements().update(filter, &row)?;
        db.execute(&statement).await?;
        self.run_hook(db, self.after_update.as_ref(), record).await
    }

    async fn delete(&self, db: &Self::Db, filter: &Filter) -> Result<()> {
        let statement = self.statements().delete(filter)?;
        db.execute(&statement).await?;
        Ok(())
    }

    async fn clear(&self, db: &Self::Db) -> Result<()> {
        db.execute(&self.statements().clear()).await?;
        Ok(())
    }
}
