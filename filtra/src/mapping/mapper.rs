//! Record ↔ row conversion for one entity type

use std::fmt;
use std::sync::Arc;

use super::{ColumnMap, Entity, Mapping};
use crate::error::{Error, Result};
use crate::filter::Value;

/// Turns a record into column values
pub type DumpFn<T> = Arc<dyn Fn(&T) -> Result<ColumnMap> + Send + Sync>;

/// Builds a record from column values given in mapping order
pub type LoadFn<T> = Arc<dyn Fn(&[Value]) -> Result<T> + Send + Sync>;

/// Table name, field mapping and conversion strategy of an entity type
///
/// Cheap to clone; every backend of the same entity shares one mapper.
pub struct Mapper<T> {
    table: String,
    mapping: Mapping,
    query: String,
    dump: DumpFn<T>,
    load: LoadFn<T>,
}

impl<T> Clone for Mapper<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            mapping: self.mapping.clone(),
            query: self.query.clone(),
            dump: Arc::clone(&self.dump),
            load: Arc::clone(&self.load),
        }
    }
}

impl<T> fmt::Debug for Mapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("table", &self.table)
            .field("mapping", &self.mapping)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl<T> Mapper<T> {
    /// Start configuring a mapper for `table`
    pub fn builder(table: impl Into<String>) -> MapperBuilder<T> {
        MapperBuilder {
            table: table.into(),
            mapping: None,
            query: None,
            dump: None,
            load: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Base `SELECT` that filters and pagination are appended to
    ///
    /// It must produce the mapped columns in mapping order.
    pub fn select_query(&self) -> &str {
        &self.query
    }

    /// Column values of a record
    pub fn dump(&self, record: &T) -> Result<ColumnMap> {
        (self.dump)(record)
    }

    /// Record from column values in mapping order
    pub fn load(&self, values: &[Value]) -> Result<T> {
        (self.load)(values)
    }

    /// Record from a column map; absent columns load as null
    pub fn load_columns(&self, columns: &ColumnMap) -> Result<T> {
        let values: Vec<Value> = self
            .mapping
            .columns()
            .map(|c| columns.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        self.load(&values)
    }

    /// Look up a field's column
    pub fn column(&self, field: &str) -> Result<&str> {
        self.mapping.column(field)
    }
}

/// Builder for [`Mapper`]
pub struct MapperBuilder<T> {
    table: String,
    mapping: Option<Mapping>,
    query: Option<String>,
    dump: Option<DumpFn<T>>,
    load: Option<LoadFn<T>>,
}

impl<T> MapperBuilder<T> {
    /// Use an explicit mapping instead of the name-for-name default
    pub fn mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Replace the default `SELECT <columns> FROM <table>` query
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Replace the dump strategy
    pub fn dump<F>(mut self, dump: F) -> Self
    where
        F: Fn(&T) -> Result<ColumnMap> + Send + Sync + 'static,
    {
        self.dump = Some(Arc::new(dump));
        self
    }

    /// Replace the load strategy
    pub fn load<F>(mut self, load: F) -> Self
    where
        F: Fn(&[Value]) -> Result<T> + Send + Sync + 'static,
    {
        self.load = Some(Arc::new(load));
        self
    }

    /// Build a mapper for a type without [`Entity`] support
    ///
    /// Mapping, dump and load must all be given.
    pub fn build_custom(self) -> Result<Mapper<T>> {
        check_table(&self.table)?;
        let missing = |what: &str| Error::Config(format!("{} for `{}` is not set", what, self.table));
        let mapping = self.mapping.clone().ok_or_else(|| missing("mapping"))?;
        let dump = self.dump.clone().ok_or_else(|| missing("dump"))?;
        let load = self.load.clone().ok_or_else(|| missing("load"))?;
        let query = select_query(&self.table, &mapping, self.query);
        Ok(Mapper {
            table: self.table,
            mapping,
            query,
            dump,
            load,
        })
    }
}

impl<T: Entity + Default + 'static> MapperBuilder<T> {
    /// Build the mapper, filling unset parts with attribute-based defaults
    pub fn build(self) -> Result<Mapper<T>> {
        check_table(&self.table)?;
        let mapping = match self.mapping {
            Some(m) => m,
            None => Mapping::derive::<T>(),
        };
        for field in mapping.fields() {
            if !T::attributes().contains(&field) {
                return Err(Error::Config(format!(
                    "mapped field `{}` is not an attribute of `{}`",
                    field, self.table
                )));
            }
        }

        let dump = self.dump.unwrap_or_else(|| default_dump::<T>(mapping.clone()));
        let load = self.load.unwrap_or_else(|| default_load::<T>(mapping.clone()));
        let query = select_query(&self.table, &mapping, self.query);

        tracing::trace!(table = %self.table, fields = mapping.len(), "Built mapper");
        Ok(Mapper {
            table: self.table,
            mapping,
            query,
            dump,
            load,
        })
    }
}

fn select_query(table: &str, mapping: &Mapping, custom: Option<String>) -> String {
    custom.unwrap_or_else(|| {
        let columns: Vec<&str> = mapping.columns().collect();
        format!("SELECT {} FROM {}", columns.join(", "), table)
    })
}

fn check_table(table: &str) -> Result<()> {
    if table.trim().is_empty() {
        return Err(Error::Config("table name is empty".to_string()));
    }
    Ok(())
}

fn default_dump<T: Entity + 'static>(mapping: Mapping) -> DumpFn<T> {
    Arc::new(move |record: &T| -> Result<ColumnMap> {
        let mut columns = ColumnMap::new();
        for (field, column) in mapping.iter() {
            let value = record.get(field).ok_or_else(|| Error::unknown_field(field))?;
            columns.insert(column.to_string(), value);
        }
        Ok(columns)
    })
}

fn default_load<T: Entity + Default + 'static>(mapping: Mapping) -> LoadFn<T> {
    Arc::new(move |values: &[Value]| -> Result<T> {
        if values.len() != mapping.len() {
            return Err(Error::Config(format!(
                "expected {} columns, got {}",
                mapping.len(),
                values.len()
            )));
        }
        let mut record = T::default();
        for (field, value) in mapping.fields().zip(values) {
            record.set(field, value.clone())?;
        }
        Ok(record)
    })
}
