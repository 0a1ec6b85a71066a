//! PostgreSQL SQL dialect implementation

use super::SqlDialect;
use super::builder::SqlBuilder;
use super::dialect::{binary_comparison, ilike, normalize_subnet};
use crate::error::Result;
use crate::filter::{Operation, Value};
use crate::utils::sql::{LikeShape, like_pattern};

/// PostgreSQL SQL dialect
///
/// Addresses bind as text and are cast back with `::inet` so that they
/// compare against `inet` columns.
pub struct PostgresDialect;

/// Placeholder suffix for values the driver sends as text
fn cast(value: &Value) -> &'static str {
    match value {
        Value::Ip(_) => "::inet",
        _ => "",
    }
}

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn bind_value(&self, value: Value) -> Value {
        match value {
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
        binary_comparison(sql, column, op, value)?;
        sql.push(cast(value));
        Ok(())
    }

    fn is_in(&self, sql: &mut SqlBuilder<'_>, column: &str, values: &[Value]) -> Result<()> {
        sql.push(column).push(" IN (");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push_param(value.clone()).push(cast(value));
        }
        sql.push(")");
        Ok(())
    }

    fn compare_ignore_case(
        &self,
        sql: &mut SqlBuilder<'_>,
        column: &str,
        negated: bool,
        value: &str,
    ) -> Result<()> {
        ilike(sql, column, negated, like_pattern(value, LikeShape::Exact), self.like_escape());
        Ok(())
    }

    fn like(
        &self,
        sql: &mut SqlBuilder<'_>,
        column: &str,
        value: &str,
        shape: LikeShape,
        ignore_case: bool,
    ) -> Result<()> {
        let pattern = like_pattern(value, shape);
        if ignore_case {
            ilike(sql, column, false, pattern, self.like_escape());
        } else {
            sql.push(column)
                .push(" LIKE ")
                .push_param(Value::Text(pattern))
                .push(self.like_escape());
        }
        Ok(())
    }

    fn ip_within(&self, sql: &mut SqlBuilder<'_>, column: &str, subnet: &str) -> Result<()> {
        let subnet = normalize_subnet(subnet)?;
        sql.push(column)
            .push("::inet << ")
            .push_param(Value::Text(subnet))
            .push("::inet");
        Ok(())
    }

    fn supports_for_update(&self) -> bool {
        true
    }
}
