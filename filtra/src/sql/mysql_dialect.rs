//! MySQL SQL dialect implementation

use super::SqlDialect;
use super::builder::SqlBuilder;
use super::dialect::binary_comparison;
use crate::error::{Error, Result};
use crate::filter::{Operation, Value};
use crate::utils::sql::{LikeShape, like_pattern};

/// Binary collation forcing case-sensitive text comparison
const BINARY_COLLATION: &str = "utf8mb4_bin";

/// MySQL SQL dialect
///
/// Float columns are compared with a `1e-4` tolerance and text columns with
/// a binary collation. There is no `IsNull` or `IPWithin` rule.
pub struct MysqlDialect;

impl MysqlDialect {
    fn compare_float(&self, sql: &mut SqlBuilder<'_>, column: &str, op: Operation, value: f64) {
        let param = Value::Float(value);
        match op {
            Operation::Eq => {
                sql.push(column).push(" LIKE ").push_param(param);
            }
            Operation::Ne => {
                sql.push(column).push(" NOT LIKE ").push_param(param);
            }
            Operation::Lt => {
                sql.push(column).push(" - ").push_param(param).push(" < -0.0001");
            }
            Operation::Gt => {
                sql.push(column).push(" - ").push_param(param).push(" > 0.0001");
            }
            Operation::Lte => {
                sql.push("(")
                    .push(column)
                    .push(" LIKE ")
                    .push_param(param.clone())
                    .push(" OR ")
                    .push(column)
                    .push(" - ")
                    .push_param(param)
                    .push(" < -0.0001)");
            }
            _ => {
                sql.push("(")
                    .push(column)
                    .push(" LIKE ")
                    .push_param(param.clone())
                    .push(" OR ")
                    .push(column)
                    .push(" - ")
                    .push_param(param)
                    .push(" > 0.0001)");
            }
        }
    }
}

impl SqlDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn bind_value(&self, value: Value) -> Value {
        match value {
            Value::Timestamp(t) => Value::Text(t.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::Uuid(u) => Value::Text(u.to_string()),
            Value::Ip(ip) => Value::Text(ip.to_string()),
            other => other,
        }
    }

    fn compare(
        &self,
        sql: &mut SqlBuilder<'_>,
        column: &str,
        op: Operation,
        value: &Value,
    ) -> Result<()> {
        match value {
            Value::Float(x) if super::dialect::comparison_operator(op).is_some() => {
                self.compare_float(sql, column, op, *x);
                Ok(())
            }
            Value::Text(_) => {
                let collated = format!("{} COLLATE {}", column, BINARY_COLLATION);
                binary_comparison(sql, &collated, op, value)
            }
            _ => binary_comparison(sql, column, op, value),
        }
    }

    fn is_in(&self, sql: &mut SqlBuilder<'_>, column: &str, values: &[Value]) -> Result<()> {
        sql.push(column);
        if values.iter().any(|v| matches!(v, Value::Text(_))) {
            sql.push(" COLLATE ").push(BINARY_COLLATION);
        }
        sql.push(" IN (")
            .push_params(", ", values.iter().cloned())
            .push(")");
        Ok(())
    }

    fn is_null(&self, _sql: &mut SqlBuilder<'_>, _column: &str) -> Result<()> {
        Err(Error::unsupported_operation(Operation::IsNull, self.name()))
    }

    fn like(
        &self,
        sql: &mut SqlBuilder<'_>,
        column: &str,
        value: &str,
        shape: LikeShape,
        ignore_case: bool,
    ) -> Result<()> {
        let pattern = Value::Text(like_pattern(value, shape));
        if ignore_case {
            sql.push("UPPER(")
                .push(column)
                .push(") LIKE UPPER(")
                .push_param(pattern)
                .push(")");
        } else {
            sql.push(column)
                .push(" COLLATE ")
                .push(BINARY_COLLATION)
                .push(" LIKE ")
                .push_param(pattern);
        }
        Ok(())
    }

    fn like_escape(&self) -> &'static str {
        ""
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }

    fn supports_for_update(&self) -> bool {
        true
    }

    fn float_tolerance(&self) -> Option<f64> {
        Some(1e-4)
    }
}
