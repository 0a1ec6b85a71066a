//! SQLite SQL dialect implementation

use chrono::SecondsFormat;

use super::SqlDialect;
use crate::filter::Value;

/// SQLite SQL dialect
///
/// Shares the generic rules. LIKE is only case-sensitive when the connection
/// runs with `PRAGMA case_sensitive_like = ON`.
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn bind_value(&self, value: Value) -> Value {
        // SQLite has no timestamp, decimal, uuid or inet storage class
        match value {
            Value::Timestamp(t) => Value::Text(t.to_rfc3339_opts(SecondsFormat::Micros, true)),
            Value::Decimal(d) => Value::Text(d.to_string()),
            Value::Uuid(u) => Value::Text(u.to_string()),
            Value::Ip(ip) => Value::Text(ip.to_string()),
            other => other,
        }
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("-1")
    }
}
