//! In-memory repository
//!
//! [`MemoryRepo`] keeps the same contract as the SQL repository and is the
//! reference the SQL backends are tested against. The synchronous methods
//! also work inside [`MemoryDb::transaction`].

use async_trait::async_trait;
use tracing::trace;

use super::evaluator::Evaluator;
use super::store::MemoryDb;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::mapping::{ColumnMap, Mapper};
use crate::query::Query;
use crate::repository::Repository;

/// Repository over a [`MemoryDb`] table
pub struct MemoryRepo<T> {
    mapper: Mapper<T>,
    evaluator: Evaluator,
}

impl<T> Clone for MemoryRepo<T> {
    fn clone(&self) -> Self {
        Self {
            mapper: self.mapper.clone(),
            evaluator: self.evaluator,
        }
    }
}

impl<T> MemoryRepo<T> {
    pub fn new(mapper: Mapper<T>) -> Self {
        Self {
            mapper,
            evaluator: Evaluator::new(),
        }
    }

    /// Use a specific evaluator, e.g. one built for a SQL dialect
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn mapper(&self) -> &Mapper<T> {
        &self.mapper
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    fn table(&self) -> &str {
        self.mapper.table()
    }

    /// Run `f` on this repository's rows
    fn with_rows<R>(&self, db: &MemoryDb, f: impl FnOnce(&[ColumnMap]) -> Result<R>) -> Result<R> {
        db.read(|tables| f(tables.get(self.table()).map(Vec::as_slice).unwrap_or_default()))
    }

    pub fn get(&self, db: &MemoryDb, filter: &Filter) -> Result<T> {
        self.with_rows(db, |rows| {
            let matched = self.evaluator.filter(self.mapper.mapping(), filter, rows)?;
            let row = matched.first().ok_or(Error::NotFound)?;
            self.mapper.load_columns(row)
        })
    }

    /// Same as [`get`](Self::get); writes are already serialized by the lock
    pub fn get_for_update(&self, db: &MemoryDb, filter: &Filter) -> Result<T> {
        self.get(db, filter)
    }

    pub fn exists(&self, db: &MemoryDb, filter: &Filter) -> Result<bool> {
        Ok(self.count(db, filter)? > 0)
    }

    pub fn count(&self, db: &MemoryDb, filter: &Filter) -> Result<u64> {
        self.with_rows(db, |rows| {
            let matched = self.evaluator.filter(self.mapper.mapping(), filter, rows)?;
            Ok(matched.len() as u64)
        })
    }

    pub fn count_all(&self, db: &MemoryDb) -> Result<u64> {
        self.with_rows(db, |rows| Ok(rows.len() as u64))
    }

    pub fn get_many(&self, db: &MemoryDb, query: &Query) -> Result<Vec<T>> {
        self.with_rows(db, |rows| {
            self.evaluator
                .select(self.mapper.mapping(), query, rows)?
                .into_iter()
                .map(|row| self.mapper.load_columns(row))
                .collect()
        })
    }

    pub fn get_first(&self, db: &MemoryDb, query: &Query) -> Result<T> {
        let first = query.clone().with_limit(1);
        self.get_many(db, &first)?
            .into_iter()
            .next()
            .ok_or(Error::NotFound)
    }

    pub fn add(&self, db: &MemoryDb, record: &T) -> Result<()> {
        let row = self.mapper.dump(record)?;
        db.write(|tables| {
            tables.entry(self.table().to_string()).or_default().push(row);
        });
        trace!(table = self.table(), "Added record");
        Ok(())
    }

    /// Add every record, or none if one fails to dump
    pub fn add_many(&self, db: &MemoryDb, records: &[T]) -> Result<()> {
        let rows = records
            .iter()
            .map(|r| self.mapper.dump(r))
            .collect::<Result<Vec<_>>>()?;
        let added = rows.len();
        db.write(|tables| {
            tables.entry(self.table().to_string()).or_default().extend(rows);
        });
        trace!(table = self.table(), added, "Added records");
        Ok(())
    }

    /// Replace every matching row with `record`
    pub fn update(&self, db: &MemoryDb, filter: &Filter, record: &T) -> Result<()> {
        let mapping = self.mapper.mapping();
        self.evaluator.validate(mapping, filter)?;
        let row = self.mapper.dump(record)?;
        db.write(|tables| {
            let Some(rows) = tables.get_mut(self.table()) else {
                return Ok(());
            };
            let hits = self.evaluator.positions(mapping, filter, rows)?;
            for &i in &hits {
                rows[i] = row.clone();
            }
            trace!(table = self.table(), updated = hits.len(), "Updated records");
            Ok(())
        })
    }

    pub fn delete(&self, db: &MemoryDb, filter: &Filter) -> Result<()> {
        let mapping = self.mapper.mapping();
        self.evaluator.validate(mapping, filter)?;
        db.write(|tables| {
            let Some(rows) = tables.get_mut(self.table()) else {
                return Ok(());
            };
            let hits = self.evaluator.positions(mapping, filter, rows)?;
            let mut index = 0;
            rows.retain(|_| {
                let keep = hits.binary_search(&index).is_err();
                index += 1;
                keep
            });
            trace!(table = self.table(), deleted = hits.len(), "Deleted records");
            Ok(())
        })
    }

    pub fn clear(&self, db: &MemoryDb) -> Result<()> {
        db.write(|tables| tables.remove(self.table()));
        Ok(())
    }
}

#[async_trait]
impl<T> Repository<T> for MemoryRepo<T>
where
    T: Send + Sync + 'static,
{
    type Db = MemoryDb;

    async fn get(&self, db: &Self::Db, filter: &Filter) -> Result<T> {
        MemoryRepo::get(self, db, filter)
    }

    async fn get_for_update(&self, db: &Self::Db, filter: &Filter) -> Result<T> {
        MemoryRepo::get_for_update(self, db, filter)
    }

    async fn exists(&self, db: &Self::Db, filter: &Filter) -> Result<bool> {
        MemoryRepo::exists(self, db, filter)
    }

    async fn count(&self, db: &Self::Db, filter: &Filter) -> Result<u64> {
        MemoryRepo::count(self, db, filter)
    }

    async fn count_all(&self, db: &Self::Db) -> Result<u64> {
        MemoryRepo::count_all(self, db)
    }

    async fn get_many(&self, db: &Self::Db, query: &Query) -> Result<Vec<T>> {
        MemoryRepo::get_many(self, db, query)
    }

    async fn get_first(&self, db: &Self::Db, query: &Query) -> Result<T> {
        MemoryRepo::get_first(self, db, query)
    }

    async fn add(&self, db: &Self::Db, record: &T) -> Result<()> {
        MemoryRepo::add(self, db, record)
    }

    async fn add_many(&self, db: &Self::Db, records: &[T]) -> Result<()> {
        MemoryRepo::add_many(self, db, records)
    }

    async fn update(&self, db: &Self::Db, filter: &Filter, record: &T) -> Result<()> {
        MemoryRepo::update(self, db, filter, record)
    }

    async fn delete(&self, db: &Self::Db, filter: &Filter) -> Result<()> {
        MemoryRepo::delete(self, db, filter)
    }

    async fn clear(&self, db: &Self::Db) -> Result<()> {
        MemoryRepo::clear(self, db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{
        FilterValue, Operation, contains, eq, gt, ihas_prefix, ip_within, is_in, not,
    };
    use crate::query::{asc, desc};
    use std::net::IpAddr;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct User {
        name: String,
        age: i64,
        active: bool,
        ip_address: Option<IpAddr>,
    }

    crate::entity!(User {
        name,
        age,
        active,
        ip_address
    });

    fn user(name: &str, age: i64, active: bool, ip: &str) -> User {
        User {
            name: name.to_string(),
            age,
            active,
            ip_address: Some(ip.parse().unwrap()),
        }
    }

    fn seeded() -> (MemoryDb, MemoryRepo<User>) {
        let db = MemoryDb::new();
        let repo = MemoryRepo::new(Mapper::<User>::builder("users").build().unwrap());
        repo.add_many(
            &db,
            &[
                user("Alice", 23, true, "192.168.1.1"),
                user("Bob", 27, true, "192.168.1.2"),
                user("Eve", 36, false, "192.168.2.1"),
            ],
        )
        .unwrap();
        (db, repo)
    }

    fn names(users: Vec<User>) -> Vec<String> {
        users.into_iter().map(|u| u.name).collect()
    }

    #[test]
    fn test_get_and_not_found() {
        let (db, repo) = seeded();
        assert_eq!(repo.get(&db, &eq("name", "Bob")).unwrap().age, 27);
        assert_eq!(repo.get(&db, &ihas_prefix("name", "a")).unwrap().name, "Alice");
        assert!(repo.get(&db, &eq("name", "Mallory")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_counts() {
        let (db, repo) = seeded();
        assert_eq!(repo.count_all(&db).unwrap(), 3);
        assert_eq!(repo.count(&db, &is_in("age", [23, 36])).unwrap(), 2);
        assert!(repo.exists(&db, &ip_within("ip_address", "192.168.2.0/24")).unwrap());
        assert!(!repo.exists(&db, &gt("age", 40)).unwrap());
    }

    #[test]
    fn test_get_many_and_first() {
        let (db, repo) = seeded();
        let query = Query::filtered(not(contains("name", "e"))).order_by([asc("age")]);
        assert_eq!(names(repo.get_many(&db, &query).unwrap()), vec!["Bob"]);

        let page = Query::new().with_limit(2).order_by([asc("name")]);
        assert_eq!(names(repo.get_many(&db, &page).unwrap()), vec!["Alice", "Bob"]);

        let oldest = repo.get_first(&db, &Query::new().order_by([desc("age")])).unwrap();
        assert_eq!(oldest.name, "Eve");
        let none = Query::filtered(gt("age", 99));
        assert!(repo.get_first(&db, &none).unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_replaces_every_match() {
        let (db, repo) = seeded();
        let retired = user("Retired", 65, false, "10.0.0.1");
        repo.update(&db, &eq("active", true), &retired).unwrap();
        assert_eq!(repo.count(&db, &eq("name", "Retired")).unwrap(), 2);
        assert_eq!(repo.count_all(&db).unwrap(), 3);
    }

    #[test]
    fn test_delete_and_clear() {
        let (db, repo) = seeded();
        repo.delete(&db, &gt("age", 25)).unwrap();
        assert_eq!(names(repo.get_many(&db, &Query::new()).unwrap()), vec!["Alice"]);
        repo.clear(&db).unwrap();
        assert_eq!(repo.count_all(&db).unwrap(), 0);
    }

    #[test]
    fn test_filter_errors_on_empty_table() {
        let db = MemoryDb::new();
        let repo = MemoryRepo::new(Mapper::<User>::builder("users").build().unwrap());
        let unknown = eq("nickname", "x");
        let err = repo.delete(&db, &unknown).unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));
        let err = repo.update(&db, &unknown, &User::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));
        let err = repo.count(&db, &unknown).unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));

        let malformed = Filter::new("age", Operation::In, FilterValue::Scalar(1.into()));
        let err = repo.delete(&db, &malformed).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }));
        let err = repo.update(&db, &malformed, &User::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }));

        assert_eq!(repo.count_all(&db).unwrap(), 0);
    }

    #[test]
    fn test_transaction_rolls_back_repository_writes() {
        let (db, repo) = seeded();
        let result = db.transaction(|tx| {
            repo.delete(tx, &eq("name", "Alice"))?;
            repo.get(tx, &eq("name", "Alice"))
        });
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(repo.count_all(&db).unwrap(), 3);

        db.transaction(|tx| repo.add(tx, &user("Mallory", 40, false, "10.0.0.2")))
            .unwrap();
        assert_eq!(repo.count_all(&db).unwrap(), 4);
    }

    #[tokio::test]
    async fn test_through_repository_trait() {
        async fn adults<R: Repository<User, Db = MemoryDb>>(repo: &R, db: &MemoryDb) -> u64 {
            repo.count(db, &gt("age", 25)).await.unwrap()
        }
        let (db, repo) = seeded();
        assert_eq!(adults(&repo, &db).await, 2);
    }
}
