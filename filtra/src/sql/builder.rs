//! Statement text accumulator

use std::fmt;

use serde::Serialize;

use super::dialect::SqlDialect;
use crate::filter::Value;

/// Parameterized SQL ready for a driver
///
/// `params[i]` binds to the `i + 1`-th placeholder of `sql`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// Statement without parameters
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Builds SQL text and its parameter list together
///
/// Placeholders and bound values come from the dialect, so callers only
/// push fragments and raw values.
pub struct SqlBuilder<'a> {
    dialect: &'a dyn SqlDialect,
    sql: String,
    params: Vec<Value>,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &'a dyn SqlDialect {
        self.dialect
    }

    /// Append raw SQL text
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Append a placeholder and record its parameter
    pub fn push_param(&mut self, value: Value) -> &mut Self {
        self.params.push(self.dialect.bind_value(value));
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
        self
    }

    /// Append placeholders for every value, separated by `separator`
    pub fn push_params(
        &mut self,
        separator: &str,
        values: impl IntoIterator<Item = Value>,
    ) -> &mut Self {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.push_param(value);
        }
        self
    }

    /// Append raw fragments separated by `separator`
    pub fn push_joined<S: AsRef<str>>(
        &mut self,
        separator: &str,
        fragments: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.push(fragment.as_ref());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn build(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}
