//! In-memory filter evaluation
//!
//! Evaluates filters with SQL three-valued logic: a comparison involving
//! NULL is unknown (`None`), `Not` keeps unknown as unknown, and a row only
//! matches when the result is definitely true.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::net::IpAddr;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::trace;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::filter::{Filter, FilterValue, Operation, Subnet, Value, parse_timestamp};
use crate::mapping::{ColumnMap, Mapping};
use crate::query::Query;
use crate::sql::SqlDialect;

/// Evaluates filters and queries against column maps
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Evaluator {
    float_tolerance: Option<f64>,
}

impl Evaluator {
    /// Evaluator with exact float comparison
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator reproducing the comparison rules of a SQL dialect
    pub fn for_dialect(dialect: &dyn SqlDialect) -> Self {
        Self {
            float_tolerance: dialect.float_tolerance(),
        }
    }

    /// Compare float operands with the given tolerance
    pub fn with_float_tolerance(mut self, tolerance: f64) -> Self {
        self.float_tolerance = Some(tolerance);
        self
    }

    pub fn float_tolerance(&self) -> Option<f64> {
        self.float_tolerance
    }

    /// Check field names and operand shapes without touching any row
    pub fn validate(&self, mapping: &Mapping, filter: &Filter) -> Result<()> {
        check(mapping, filter)
    }

    /// Whether a row definitely matches the filter
    pub fn matches(&self, mapping: &Mapping, filter: &Filter, row: &ColumnMap) -> Result<bool> {
        check(mapping, filter)?;
        Ok(self.eval(mapping, filter, row)? == Some(true))
    }

    /// Three-valued result of the filter on one row
    pub fn evaluate(
        &self,
        mapping: &Mapping,
        filter: &Filter,
        row: &ColumnMap,
    ) -> Result<Option<bool>> {
        check(mapping, filter)?;
        self.eval(mapping, filter, row)
    }

    /// Rows matching the filter, in their stored order
    pub fn filter<'r>(
        &self,
        mapping: &Mapping,
        filter: &Filter,
        rows: &'r [ColumnMap],
    ) -> Result<Vec<&'r ColumnMap>> {
        let hits = self.positions(mapping, filter, rows)?;
        Ok(hits.into_iter().map(|i| &rows[i]).collect())
    }

    /// Indexes of the rows matching the filter, ascending
    ///
    /// The filter is validated even when `rows` is empty.
    pub fn positions(
        &self,
        mapping: &Mapping,
        filter: &Filter,
        rows: &[ColumnMap],
    ) -> Result<Vec<usize>> {
        check(mapping, filter)?;
        let mut hits = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if self.eval(mapping, filter, row)? == Some(true) {
                hits.push(i);
            }
        }
        trace!(matched = hits.len(), total = rows.len(), "Evaluated filter");
        Ok(hits)
    }

    /// Filter, order and paginate rows
    pub fn select<'r>(
        &self,
        mapping: &Mapping,
        query: &Query,
        rows: &'r [ColumnMap],
    ) -> Result<Vec<&'r ColumnMap>> {
        let keys = query
            .order
            .iter()
            .map(|o| -> Result<(&str, bool)> { Ok((mapping.column(&o.field)?, o.desc)) })
            .collect::<Result<Vec<_>>>()?;

        let mut selected = match &query.filter {
            Some(filter) => self.filter(mapping, filter, rows)?,
            None => rows.iter().collect(),
        };

        if !keys.is_empty() {
            selected.sort_by(|a, b| {
                keys.iter()
                    .map(|&(column, desc)| {
                        let ord = sort_cmp(cell(a, column), cell(b, column));
                        if desc { ord.reverse() } else { ord }
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = match query.limit {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        let page: Vec<&ColumnMap> = selected.into_iter().skip(offset).take(limit).collect();
        trace!(
            returned = page.len(),
            offset = query.offset,
            limit = query.limit,
            "Evaluated query"
        );
        Ok(page)
    }

    fn eval(&self, mapping: &Mapping, filter: &Filter, row: &ColumnMap) -> Result<Option<bool>> {
        match (&filter.operation, &filter.value) {
            (Operation::Not, FilterValue::Filter(inner)) => {
                Ok(self.eval(mapping, inner, row)?.map(|b| !b))
            }
            (Operation::And, FilterValue::Filters(items)) => {
                let mut unknown = false;
                for item in items {
                    match self.eval(mapping, item, row)? {
                        Some(false) => return Ok(Some(false)),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                Ok(if unknown { None } else { Some(true) })
            }
            (Operation::Or, FilterValue::Filters(items)) => {
                let mut unknown = false;
                for item in items {
                    match self.eval(mapping, item, row)? {
                        Some(true) => return Ok(Some(true)),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                Ok(if unknown { None } else { Some(false) })
            }
            (op, value) => {
                let column = mapping.column(&filter.field)?;
                self.leaf(*op, cell(row, column), value)
            }
        }
    }

    fn leaf(&self, op: Operation, field: &Value, operand: &FilterValue) -> Result<Option<bool>> {
        match (op, operand) {
            (Operation::IsNull, _) => Ok(Some(field.is_null())),
            // `IN ()` compiles to a constant false, even for NULL fields
            (Operation::In, FilterValue::List(values)) if values.is_empty() => Ok(Some(false)),
            _ if field.is_null() => Ok(None),
            (Operation::In, FilterValue::List(values)) => {
                let mut unknown = false;
                for candidate in values {
                    match self.compare(Operation::In, field, candidate)? {
                        Some(Ordering::Equal) => return Ok(Some(true)),
                        None => unknown = true,
                        Some(_) => {}
                    }
                }
                Ok(if unknown { None } else { Some(false) })
            }
            (_, FilterValue::Scalar(value)) => self.scalar(op, field, value),
            (op, value) => Err(Error::unsupported_value(op, value.kind())),
        }
    }

    fn scalar(&self, op: Operation, field: &Value, operand: &Value) -> Result<Option<bool>> {
        match op {
            Operation::Eq
            | Operation::Ne
            | Operation::Lt
            | Operation::Gt
            | Operation::Lte
            | Operation::Gte => {
                if let (Some(tolerance), Value::Float(x)) = (self.float_tolerance, operand) {
                    return tolerant(op, field, *x, tolerance);
                }
                let ord = self.compare(op, field, operand)?;
                Ok(ord.map(|ord| match op {
                    Operation::Eq => ord.is_eq(),
                    Operation::Ne => ord.is_ne(),
                    Operation::Lt => ord.is_lt(),
                    Operation::Gt => ord.is_gt(),
                    Operation::Lte => ord.is_le(),
                    _ => ord.is_ge(),
                }))
            }
            Operation::IEq | Operation::INe => {
                let (f, v) = (text(op, field)?, text(op, operand)?);
                let equal = f.to_uppercase() == v.to_uppercase();
                Ok(Some(equal == (op == Operation::IEq)))
            }
            Operation::Contains | Operation::HasPrefix | Operation::HasSuffix => {
                let (f, v) = (text(op, field)?, text(op, operand)?);
                Ok(Some(substring(op, &f, &v)))
            }
            Operation::IContains | Operation::IHasPrefix | Operation::IHasSuffix => {
                let (f, v) = (text(op, field)?, text(op, operand)?);
                Ok(Some(substring(op, &f.to_uppercase(), &v.to_uppercase())))
            }
            Operation::IpWithin => {
                let subnet = Subnet::from_str(&text(op, operand)?)?;
                let addr = match field {
                    Value::Ip(ip) => *ip,
                    Value::Text(s) => IpAddr::from_str(s)
                        .map_err(|_| Error::unsupported_value(op, field.type_name()))?,
                    other => return Err(Error::unsupported_value(op, other.type_name())),
                };
                Ok(Some(subnet.contains(&addr)))
            }
            _ => Err(Error::unsupported_value(op, operand.type_name())),
        }
    }

    /// Order of two non-null values; `None` when the operand is NULL
    fn compare(&self, op: Operation, field: &Value, operand: &Value) -> Result<Option<Ordering>> {
        if operand.is_null() {
            return Ok(None);
        }
        value_cmp(field, operand)
            .map(Some)
            .ok_or_else(|| Error::unsupported_value(op, field.type_name()))
    }
}

fn cell<'r>(row: &'r ColumnMap, column: &str) -> &'r Value {
    static NULL: Value = Value::Null;
    row.get(column).unwrap_or(&NULL)
}

/// Textual form of a value for the string operations
///
/// Addresses, UUIDs and timestamps decoded from JSON text keep matching as text.
fn text(op: Operation, value: &Value) -> Result<Cow<'_, str>> {
    match value {
        Value::Text(s) => Ok(Cow::Borrowed(s)),
        Value::Ip(_) | Value::Uuid(_) | Value::Timestamp(_) => Ok(Cow::Owned(value.to_string())),
        other => Err(Error::unsupported_value(op, other.type_name())),
    }
}

fn substring(op: Operation, field: &str, value: &str) -> bool {
    match op {
        Operation::Contains | Operation::IContains => field.contains(value),
        Operation::HasPrefix | Operation::IHasPrefix => field.starts_with(value),
        _ => field.ends_with(value),
    }
}

/// Float comparison with the rules of MySQL
///
/// Equality stays exact (MySQL tests it with `LIKE`); only the strict
/// `Lt` and `Gt` parts require a difference larger than the tolerance.
fn tolerant(op: Operation, field: &Value, operand: f64, tolerance: f64) -> Result<Option<bool>> {
    let x = as_f64(field).ok_or_else(|| Error::unsupported_value(op, field.type_name()))?;
    let diff = x - operand;
    let equal = x == operand;
    Ok(Some(match op {
        Operation::Eq => equal,
        Operation::Ne => !equal,
        Operation::Lt => diff < -tolerance,
        Operation::Gt => diff > tolerance,
        Operation::Lte => equal || diff < -tolerance,
        _ => equal || diff > tolerance,
    }))
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        Value::Decimal(d) => d.to_f64(),
        _ => None,
    }
}

/// Compare two non-null values of compatible types
///
/// Numbers compare across Int, Float and Decimal. Text compares with typed
/// values by parsing it.
fn value_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Decimal(x), Value::Decimal(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Decimal(y)) => Some(Decimal::from(*x).cmp(y)),
        (Value::Decimal(x), Value::Int(y)) => Some(x.cmp(&Decimal::from(*y))),
        (Value::Decimal(d), Value::Float(f)) => match Decimal::try_from(*f) {
            Ok(y) => Some(d.cmp(&y)),
            Err(_) => d.to_f64()?.partial_cmp(f),
        },
        (Value::Float(_), Value::Decimal(_)) => value_cmp(b, a).map(Ordering::reverse),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            as_f64(a)?.partial_cmp(&as_f64(b)?)
        }
        (Value::Text(x), Value::Text(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Timestamp(x), Value::Text(s)) => Some(x.cmp(&parse_timestamp(s)?)),
        (Value::Text(s), Value::Timestamp(y)) => Some(parse_timestamp(s)?.cmp(y)),
        (Value::Uuid(x), Value::Uuid(y)) => Some(x.cmp(y)),
        (Value::Uuid(x), Value::Text(s)) => Some(x.cmp(&Uuid::parse_str(s).ok()?)),
        (Value::Text(s), Value::Uuid(y)) => Some(Uuid::parse_str(s).ok()?.cmp(y)),
        (Value::Ip(x), Value::Ip(y)) => Some(x.cmp(y)),
        (Value::Ip(x), Value::Text(s)) => Some(x.cmp(&IpAddr::from_str(s).ok()?)),
        (Value::Text(s), Value::Ip(y)) => Some(IpAddr::from_str(s).ok()?.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting: NULL first, then by value, then by type
fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        _ => value_cmp(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Decimal(_) => 1,
        Value::Timestamp(_) => 2,
        Value::Uuid(_) => 3,
        Value::Ip(_) => 4,
        Value::Text(_) => 5,
    }
}

/// Validate field names and operand shapes of the whole tree
///
/// Runs before evaluation so that errors do not depend on the data or on
/// short-circuiting.
fn check(mapping: &Mapping, filter: &Filter) -> Result<()> {
    match (filter.operation, &filter.value) {
        (Operation::Not, FilterValue::Filter(inner)) => check(mapping, inner),
        (Operation::And | Operation::Or, FilterValue::Filters(items)) => {
            items.iter().try_for_each(|f| check(mapping, f))
        }
        (op, value) if op.is_composite() => Err(Error::unsupported_value(op, value.kind())),
        (op, value) => {
            mapping.column(&filter.field)?;
            match (op, value) {
                (Operation::IsNull, FilterValue::None) => Ok(()),
                (Operation::In, FilterValue::List(_)) => Ok(()),
                (Operation::IpWithin, FilterValue::Scalar(Value::Text(s))) => {
                    Subnet::from_str(s).map(|_| ())
                }
                (
                    Operation::IEq
                    | Operation::INe
                    | Operation::Contains
                    | Operation::IContains
                    | Operation::HasPrefix
                    | Operation::IHasPrefix
                    | Operation::HasSuffix
                    | Operation::IHasSuffix,
                    FilterValue::Scalar(Value::Text(_)),
                ) => Ok(()),
                (
                    Operation::Eq
                    | Operation::Ne
                    | Operation::Lt
                    | Operation::Gt
                    | Operation::Lte
                    | Operation::Gte,
                    FilterValue::Scalar(_),
                ) => Ok(()),
                (op, value) => Err(Error::unsupported_value(op, value.kind())),
            }
        }
    }
}
