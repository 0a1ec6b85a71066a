//! SQL dialect trait for multi-database support
//!
//! The compiler walks a filter tree once and asks the dialect for every
//! fragment whose syntax differs between engines. Default methods carry the
//! generic (ANSI) rules; a dialect overrides only where its engine diverges.

use super::builder::SqlBuilder;
use crate::error::{Error, Result};
use crate::filter::{Operation, Subnet, Value};
use crate::utils::sql::{LikeShape, like_pattern};

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Case-insensitive matching (ILIKE vs UPPER)
/// - LIKE escaping and collation
/// - Subnet containment
/// - Limit/offset clauses
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - Generic/SQLite/MySQL/ClickHouse: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Convert a parameter into the form the driver binds
    fn bind_value(&self, value: Value) -> Value {
        value
    }

    /// `Eq`, `Ne`, `Lt`, `Gt`, `Lte` and `Gte` against a scalar
    fn compare(
        &self,
        sql: &mut SqlBuilder<'_>,
        column: &str,
        op: Operation,
        value: &Value,
    ) -> Result<()> {
        binary_comparison(sql, column, op, value)
    }

    /// `IEq` and `INe`
    ///
    /// - Most: `UPPER(col) = UPPER(?)`
    /// - PostgreSQL/ClickHouse: `col ILIKE ?`
    fn compare_ignore_case(
        &self,
        sql: &mut SqlBuilder<'_>,
        column: &str,
        negated: bool,
        value: &str,
    ) -> Result<()> {
        let op = if negated { " != " } else { " = " };
        sql.push("UPPER(")
            .push(column)
            .push(")")
            .push(op)
            .push("UPPER(")
            .push_param(Value::from(value))
            .push(")");
        Ok(())
    }

    /// `IsNull`
    fn is_null(&self, sql: &mut SqlBuilder<'_>, column: &str) -> Result<()> {
        sql.push(column).push(" IS NULL");
        Ok(())
    }

    /// `In` with at least one candidate
    fn is_in(&self, sql: &mut SqlBuilder<'_>, column: &str, values: &[Value]) -> Result<()> {
        sql.push(column)
            .push(" IN (")
            .push_params(", ", values.iter().cloned())
            .push(")");
        Ok(())
    }

    /// `Contains`, `HasPrefix`, `HasSuffix` and their case-insensitive variants
    ///
    /// The operand is matched literally: LIKE metacharacters are escaped
    /// before the wildcards are added.
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
            sql.push(column).push(" LIKE ").push_param(pattern);
        }
        sql.push(self.like_escape());
        Ok(())
    }

    /// Escape clause appended after LIKE patterns
    ///
    /// Empty for engines that treat backslash as the escape character natively.
    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    /// `IPWithin`; unsupported unless the engine has a network type
    fn ip_within(&self, _sql: &mut SqlBuilder<'_>, _column: &str, _subnet: &str) -> Result<()> {
        Err(Error::unsupported_operation(Operation::IpWithin, self.name()))
    }

    /// LIMIT value used when only an offset is requested
    ///
    /// `None` for engines that accept a bare OFFSET.
    fn unbounded_limit(&self) -> Option<&'static str> {
        None
    }

    /// Generate LIMIT/OFFSET clause; empty when both are zero
    fn limit_offset(&self, limit: u64, offset: u64) -> String {
        match (limit, offset) {
            (0, 0) => String::new(),
            (limit, 0) => format!("LIMIT {}", limit),
            (0, offset) => match self.unbounded_limit() {
                Some(max) => format!("LIMIT {} OFFSET {}", max, offset),
                None => format!("OFFSET {}", offset),
            },
            (limit, offset) => format!("LIMIT {} OFFSET {}", limit, offset),
        }
    }

    /// Whether `SELECT ... FOR UPDATE` locks rows on this engine
    fn supports_for_update(&self) -> bool {
        false
    }

    /// Tolerance the engine applies to float comparisons
    fn float_tolerance(&self) -> Option<f64> {
        None
    }

    /// Statement head of an UPDATE, up to the first assignment
    fn update_prefix(&self, table: &str) -> String {
        format!("UPDATE {} SET ", table)
    }

    /// Statement removing every row of a table
    fn clear_table(&self, table: &str) -> String {
        format!("DELETE FROM {}", table)
    }
}

/// SQL operator of a comparison operation
pub fn comparison_operator(op: Operation) -> Option<&'static str> {
    match op {
        Operation::Eq => Some("="),
        Operation::Ne => Some("!="),
        Operation::Lt => Some("<"),
        Operation::Gt => Some(">"),
        Operation::Lte => Some("<="),
        Operation::Gte => Some(">="),
        _ => None,
    }
}

/// `col <op> ?`
pub fn binary_comparison(
    sql: &mut SqlBuilder<'_>,
    column: &str,
    op: Operation,
    value: &Value,
) -> Result<()> {
    let operator =
        comparison_operator(op).ok_or_else(|| Error::unsupported_value(op, value.type_name()))?;
    sql.push(column)
        .push(" ")
        .push(operator)
        .push(" ")
        .push_param(value.clone());
    Ok(())
}

/// `col [NOT] ILIKE ?` for engines with a native case-insensitive LIKE
pub fn ilike(sql: &mut SqlBuilder<'_>, column: &str, negated: bool, pattern: String, escape: &str) {
    let op = if negated { " NOT ILIKE " } else { " ILIKE " };
    sql.push(column)
        .push(op)
        .push_param(Value::Text(pattern))
        .push(escape);
}

/// Validate a subnet literal and return its normalized `addr/len` form
pub fn normalize_subnet(subnet: &str) -> Result<String> {
    let parsed: Subnet = subnet.parse()?;
    Ok(parsed.to_string())
}

/// Database dialect identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Generic,
    Sqlite,
    Mysql,
    Postgres,
    Clickhouse,
}

impl DialectKind {
    /// All dialects, in declaration order
    pub const ALL: [DialectKind; 5] = [
        DialectKind::Generic,
        DialectKind::Sqlite,
        DialectKind::Mysql,
        DialectKind::Postgres,
        DialectKind::Clickhouse,
    ];

    /// Get the SQL dialect for this identifier
    pub fn dialect(&self) -> Box<dyn SqlDialect> {
        match self {
            DialectKind::Generic => Box::new(super::GenericDialect),
            DialectKind::Sqlite => Box::new(super::SqliteDialect),
            DialectKind::Mysql => Box::new(super::MysqlDialect),
            DialectKind::Postgres => Box::new(super::PostgresDialect),
            DialectKind::Clickhouse => Box::new(super::ClickhouseDialect),
        }
    }

    /// Get the dialect name
    pub fn name(&self) -> &'static str {
        match self {
            DialectKind::Generic => "generic",
            DialectKind::Sqlite => "sqlite",
            DialectKind::Mysql => "mysql",
            DialectKind::Postgres => "postgres",
            DialectKind::Clickhouse => "clickhouse",
        }
    }
}

impl std::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DialectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(DialectKind::Generic),
            "sqlite" | "sqlite3" => Ok(DialectKind::Sqlite),
            "mysql" => Ok(DialectKind::Mysql),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "clickhouse" => Ok(DialectKind::Clickhouse),
            other => Err(Error::Config(format!("unknown dialect `{}`", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_offset_default() {
        let dialect = DialectKind::Generic.dialect();
        assert_eq!(dialect.limit_offset(0, 0), "");
        assert_eq!(dialect.limit_offset(10, 0), "LIMIT 10");
        assert_eq!(dialect.limit_offset(0, 5), "OFFSET 5");
        assert_eq!(dialect.limit_offset(10, 5), "LIMIT 10 OFFSET 5");
    }

    #[test]
    fn test_dialect_kind_names_match_dialects() {
        for kind in DialectKind::ALL {
            assert_eq!(kind.dialect().name(), kind.name());
            assert_eq!(kind.to_string().parse::<DialectKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_dialect_kind_aliases() {
        assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("sqlite3".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert!(matches!("oracle".parse::<DialectKind>(), Err(Error::Config(_))));
    }

    #[test]
    fn test_dialect_kind_serde() {
        let kind: DialectKind = serde_json::from_str(r#""clickhouse""#).unwrap();
        assert_eq!(kind, DialectKind::Clickhouse);
        assert_eq!(serde_json::to_string(&DialectKind::Mysql).unwrap(), r#""mysql""#);
    }

    #[test]
    fn test_comparison_operator() {
        assert_eq!(comparison_operator(Operation::Ne), Some("!="));
        assert_eq!(comparison_operator(Operation::In), None);
    }

    #[test]
    fn test_normalize_subnet() {
        assert_eq!(normalize_subnet("192.168.1.0/24").unwrap(), "192.168.1.0/24");
        assert_eq!(normalize_subnet("10.0.0.1").unwrap(), "10.0.0.1/32");
        assert!(matches!(normalize_subnet("10.0.0.0/40"), Err(Error::InvalidSubnet(_))));
    }
}
