//! Filter and query compilation
//!
//! One tree walk shared by every dialect. Leaves resolve their field through
//! the [`Mapping`] and delegate the fragment to the [`SqlDialect`]. Errors
//! abort the walk, so a failed compilation never yields partial SQL.

use tracing::debug;

use super::builder::{SqlBuilder, Statement};
use super::dialect::SqlDialect;
use crate::error::{Error, Result};
use crate::filter::{Filter, FilterValue, Operation, Value};
use crate::mapping::{ColumnMap, Mapper, Mapping};
use crate::query::{Order, Query};
use crate::utils::sql::LikeShape;

/// Compile a filter into a `WHERE` clause body
pub fn compile_filter(
    dialect: &dyn SqlDialect,
    mapping: &Mapping,
    filter: &Filter,
) -> Result<Statement> {
    let mut sql = SqlBuilder::new(dialect);
    write_filter(&mut sql, mapping, filter)?;
    Ok(finish(sql, "filter"))
}

/// Compile a query on top of a base `SELECT`
pub fn compile_query(
    dialect: &dyn SqlDialect,
    mapping: &Mapping,
    select: &str,
    query: &Query,
) -> Result<Statement> {
    let mut sql = SqlBuilder::new(dialect);
    sql.push(select);
    write_query(&mut sql, mapping, query)?;
    Ok(finish(sql, "query"))
}

fn finish(sql: SqlBuilder<'_>, kind: &'static str) -> Statement {
    let dialect = sql.dialect().name();
    let statement = sql.build();
    debug!(
        dialect,
        kind,
        params = statement.params.len(),
        sql = %statement.sql,
        "Compiled statement"
    );
    statement
}

/// Append a filter to the builder
pub(crate) fn write_filter(
    sql: &mut SqlBuilder<'_>,
    mapping: &Mapping,
    filter: &Filter,
) -> Result<()> {
    match (filter.operation, &filter.value) {
        (Operation::Not, FilterValue::Filter(inner)) => {
            sql.push("NOT (");
            write_filter(sql, mapping, inner)?;
            sql.push(")");
        }
        (Operation::And, FilterValue::Filters(items)) => {
            write_junction(sql, mapping, items, " AND ", "1 = 1")?;
        }
        (Operation::Or, FilterValue::Filters(items)) => {
            write_junction(sql, mapping, items, " OR ", "1 = 0")?;
        }
        (op, value) if op.is_composite() => {
            return Err(Error::unsupported_value(op, value.kind()));
        }
        (op, value) => {
            let column = mapping.column(&filter.field)?;
            write_leaf(sql, column, op, value)?;
        }
    }
    Ok(())
}

fn write_junction(
    sql: &mut SqlBuilder<'_>,
    mapping: &Mapping,
    items: &[Filter],
    separator: &str,
    empty: &str,
) -> Result<()> {
    if items.is_empty() {
        sql.push(empty);
        return Ok(());
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            sql.push(separator);
        }
        sql.push("(");
        write_filter(sql, mapping, item)?;
        sql.push(")");
    }
    Ok(())
}

fn write_leaf(
    sql: &mut SqlBuilder<'_>,
    column: &str,
    op: Operation,
    value: &FilterValue,
) -> Result<()> {
    let dialect = sql.dialect();
    match (op, value) {
        (Operation::IsNull, FilterValue::None) => dialect.is_null(sql, column),
        (
            Operation::Eq
            | Operation::Ne
            | Operation::Lt
            | Operation::Gt
            | Operation::Lte
            | Operation::Gte,
            FilterValue::Scalar(v),
        ) => dialect.compare(sql, column, op, v),
        (Operation::IEq | Operation::INe, FilterValue::Scalar(Value::Text(s))) => {
            dialect.compare_ignore_case(sql, column, op == Operation::INe, s)
        }
        (Operation::In, FilterValue::List(values)) => {
            if values.is_empty() {
                sql.push("1 = 0");
                return Ok(());
            }
            dialect.is_in(sql, column, values)
        }
        (
            Operation::Contains
            | Operation::IContains
            | Operation::HasPrefix
            | Operation::IHasPrefix
            | Operation::HasSuffix
            | Operation::IHasSuffix,
            FilterValue::Scalar(Value::Text(s)),
        ) => {
            let (shape, ignore_case) = like_shape(op);
            dialect.like(sql, column, s, shape, ignore_case)
        }
        (Operation::IpWithin, FilterValue::Scalar(Value::Text(s))) => {
            dialect.ip_within(sql, column, s)
        }
        (op, value) => Err(Error::unsupported_value(op, value.kind())),
    }
}

fn like_shape(op: Operation) -> (LikeShape, bool) {
    match op {
        Operation::Contains => (LikeShape::Contains, false),
        Operation::IContains => (LikeShape::Contains, true),
        Operation::HasPrefix => (LikeShape::Prefix, false),
        Operation::IHasPrefix => (LikeShape::Prefix, true),
        Operation::HasSuffix => (LikeShape::Suffix, false),
        _ => (LikeShape::Suffix, true),
    }
}

fn write_query(sql: &mut SqlBuilder<'_>, mapping: &Mapping, query: &Query) -> Result<()> {
    if let Some(filter) = &query.filter {
        sql.push(" WHERE ");
        write_filter(sql, mapping, filter)?;
    }
    write_order(sql, mapping, &query.order)?;
    let pagination = sql.dialect().limit_offset(query.limit, query.offset);
    if !pagination.is_empty() {
        sql.push(" ").push(&pagination);
    }
    Ok(())
}

fn write_order(sql: &mut SqlBuilder<'_>, mapping: &Mapping, order: &[Order]) -> Result<()> {
    if order.is_empty() {
        return Ok(());
    }
    let keys = order
        .iter()
        .map(|o| {
            let column = mapping.column(&o.field)?;
            Ok(if o.desc {
                format!("{} DESC", column)
            } else {
                column.to_string()
            })
        })
        .collect::<Result<Vec<_>>>()?;
    sql.push(" ORDER BY ").push_joined(", ", keys);
    Ok(())
}

/// Renders every repository operation of one entity type
///
/// Row-returning statements select the mapped columns in mapping order, so
/// results can be handed straight to the mapper's load.
#[derive(Clone, Copy)]
pub struct Statements<'a> {
    dialect: &'a dyn SqlDialect,
    table: &'a str,
    mapping: &'a Mapping,
    select: &'a str,
}

impl<'a> Statements<'a> {
    pub fn new(
        dialect: &'a dyn SqlDialect,
        table: &'a str,
        mapping: &'a Mapping,
        select: &'a str,
    ) -> Self {
        Self {
            dialect,
            table,
            mapping,
            select,
        }
    }

    /// Statements for a mapper's table, mapping and select query
    pub fn for_mapper<T>(dialect: &'a dyn SqlDialect, mapper: &'a Mapper<T>) -> Self {
        Self::new(
            dialect,
            mapper.table(),
            mapper.mapping(),
            mapper.select_query(),
        )
    }

    fn builder(&self) -> SqlBuilder<'a> {
        SqlBuilder::new(self.dialect)
    }

    /// `<select> WHERE <filter>`
    pub fn select_one(&self, filter: &Filter) -> Result<Statement> {
        let mut sql = self.builder();
        sql.push(self.select).push(" WHERE ");
        write_filter(&mut sql, self.mapping, filter)?;
        Ok(finish(sql, "select"))
    }

    /// Like [`select_one`](Self::select_one), locking the row where the engine can
    pub fn select_for_update(&self, filter: &Filter) -> Result<Statement> {
        let mut sql = self.builder();
        sql.push(self.select).push(" WHERE ");
        write_filter(&mut sql, self.mapping, filter)?;
        if self.dialect.supports_for_update() {
            sql.push(" FOR UPDATE");
        }
        Ok(finish(sql, "select_for_update"))
    }

    pub fn select_many(&self, query: &Query) -> Result<Statement> {
        let mut sql = self.builder();
        sql.push(self.select);
        write_query(&mut sql, self.mapping, query)?;
        Ok(finish(sql, "select_many"))
    }

    pub fn exists(&self, filter: &Filter) -> Result<Statement> {
        let mut sql = self.builder();
        sql.push("SELECT EXISTS (").push(self.select).push(" WHERE ");
        write_filter(&mut sql, self.mapping, filter)?;
        sql.push(")");
        Ok(finish(sql, "exists"))
    }

    pub fn count(&self, filter: &Filter) -> Result<Statement> {
        let mut sql = self.builder();
        sql.push("SELECT COUNT(1) FROM (")
            .push(self.select)
            .push(" WHERE ");
        write_filter(&mut sql, self.mapping, filter)?;
        sql.push(") AS q");
        Ok(finish(sql, "count"))
    }

    pub fn count_all(&self) -> Statement {
        Statement::raw(format!("SELECT COUNT(1) FROM ({}) AS q", self.select))
    }

    /// Multi-row `INSERT`; every row must carry the same columns
    pub fn insert(&self, rows: &[ColumnMap]) -> Result<Statement> {
        let first = rows
            .first()
            .ok_or_else(|| Error::Config(format!("nothing to insert into `{}`", self.table)))?;
        if first.is_empty() {
            return Err(Error::Config(format!("row for `{}` has no columns", self.table)));
        }
        let columns: Vec<&str> = first.keys().map(String::as_str).collect();

        let mut sql = self.builder();
        sql.push("INSERT INTO ")
            .push(self.table)
            .push(" (")
            .push_joined(", ", &columns)
            .push(") VALUES ");
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() || !columns.iter().all(|c| row.contains_key(*c)) {
                return Err(Error::Config(format!(
                    "row {} for `{}` has different columns",
                    i, self.table
                )));
            }
            if i > 0 {
                sql.push(", ");
            }
            sql.push("(")
                .push_params(", ", row.values().cloned())
                .push(")");
        }
        Ok(finish(sql, "insert"))
    }

    pub fn update(&self, filter: &Filter, row: &ColumnMap) -> Result<Statement> {
        if row.is_empty() {
            return Err(Error::Config(format!("row for `{}` has no columns", self.table)));
        }
        let mut sql = self.builder();
        sql.push(&self.dialect.update_prefix(self.table));
        for (i, (column, value)) in row.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push(column).push(" = ").push_param(value.clone());
        }
        sql.push(" WHERE ");
        write_filter(&mut sql, self.mapping, filter)?;
        Ok(finish(sql, "update"))
    }

    pub fn delete(&self, filter: &Filter) -> Result<Statement> {
        let mut sql = self.builder();
        sql.push("DELETE FROM ").push(self.table).push(" WHERE ");
        write_filter(&mut sql, self.mapping, filter)?;
        Ok(finish(sql, "delete"))
    }

    pub fn clear(&self) -> Statement {
        Statement::raw(self.dialect.clear_table(self.table))
    }
}
