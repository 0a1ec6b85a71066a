//! ClickHouse SQL dialect implementation

use super::SqlDialect;
use super::builder::SqlBuilder;
use super::dialect::{ilike, normalize_subnet};
use crate::error::Result;
use crate::filter::Value;
use crate::utils::sql::{LikeShape, like_pattern};

/// ClickHouse SQL dialect
///
/// Backslash is the native LIKE escape, so patterns carry no `ESCAPE` clause.
/// Mutations go through `ALTER TABLE ... UPDATE` and `TRUNCATE`.
pub struct ClickhouseDialect;

impl SqlDialect for ClickhouseDialect {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn bind_value(&self, value: Value) -> Value {
        // DateTime64 parses zone-less ISO text in the server time zone (UTC)
        match value {
            Value::Timestamp(t) => Value::Text(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            other => other,
        }
    }

    fn compare_ignore_case(
        &self,
        sql: &mut SqlBuilder<'_>,
        column: &str,
        negated: bool,
        value: &str,
    ) -> Result<()> {
        ilike(sql, column, negated, like_pattern(value, LikeShape::Exact), "");
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
            ilike(sql, column, false, pattern, "");
        } else {
            sql.push(column).push(" LIKE ").push_param(Value::Text(pattern));
        }
        Ok(())
    }

    fn like_escape(&self) -> &'static str {
        ""
    }

    fn ip_within(&self, sql: &mut SqlBuilder<'_>, column: &str, subnet: &str) -> Result<()> {
        let subnet = normalize_subnet(subnet)?;
        sql.push("isIPAddressInRange(toString(")
            .push(column)
            .push("), ")
            .push_param(Value::Text(subnet))
            .push(")");
        Ok(())
    }

    fn update_prefix(&self, table: &str) -> String {
        format!("ALTER TABLE {} UPDATE ", table)
    }

    fn clear_table(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {}", table)
    }
}
