//! Filter type definitions
//!
//! A [`Filter`] is an immutable expression tree. Leaf nodes compare one entity
//! field with an operand; composite nodes (`Not`, `And`, `Or`) hold sub-filters.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::error::Error;

/// Comparison or logical operation of a filter node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(alias = "=")]
    Eq,
    IEq,
    #[serde(alias = "!=")]
    Ne,
    INe,
    IsNull,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = "<=")]
    Lte,
    #[serde(alias = ">=")]
    Gte,
    In,
    Contains,
    IContains,
    HasPrefix,
    IHasPrefix,
    HasSuffix,
    IHasSuffix,
    #[serde(rename = "IPWithin")]
    IpWithin,
    Not,
    And,
    Or,
}

impl Operation {
    /// Wire name of the operation
    pub fn name(&self) -> &'static str {
        match self {
            Self::Eq => "Eq",
            Self::IEq => "IEq",
            Self::Ne => "Ne",
            Self::INe => "INe",
            Self::IsNull => "IsNull",
            Self::Lt => "Lt",
            Self::Gt => "Gt",
            Self::Lte => "Lte",
            Self::Gte => "Gte",
            Self::In => "In",
            Self::Contains => "Contains",
            Self::IContains => "IContains",
            Self::HasPrefix => "HasPrefix",
            Self::IHasPrefix => "IHasPrefix",
            Self::HasSuffix => "HasSuffix",
            Self::IHasSuffix => "IHasSuffix",
            Self::IpWithin => "IPWithin",
            Self::Not => "Not",
            Self::And => "And",
            Self::Or => "Or",
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Not | Self::And | Self::Or)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operand of a filter node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// No operand (IsNull)
    None,
    Scalar(Value),
    /// Candidates for In
    List(Vec<Value>),
    /// Operand of Not
    Filter(Box<Filter>),
    /// Operands of And / Or
    Filters(Vec<Filter>),
}

impl FilterValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "nothing",
            Self::Scalar(v) => v.type_name(),
            Self::List(_) => "list",
            Self::Filter(_) => "filter",
            Self::Filters(_) => "filter list",
        }
    }
}

/// Predicate over named entity fields
///
/// Leaf filters name a field; composite filters leave `field` empty.
/// Construction never fails: shape and field names are checked when the
/// filter is compiled or evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireFilter")]
pub struct Filter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub field: String,
    #[serde(rename = "op")]
    pub operation: Operation,
    #[serde(skip_serializing_if = "FilterValue::is_none")]
    pub value: FilterValue,
}

impl FilterValue {
    fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Filter {
    pub fn new(field: impl Into<String>, operation: Operation, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operation,
            value,
        }
    }

    /// Fields referenced anywhere in this tree, depth-first
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.value {
            FilterValue::Filter(inner) => inner.collect_fields(out),
            FilterValue::Filters(items) => items.iter().for_each(|f| f.collect_fields(out)),
            _ if !self.field.is_empty() => out.push(&self.field),
            _ => {}
        }
    }

    /// Nesting depth; a leaf has depth 1
    pub fn depth(&self) -> usize {
        match &self.value {
            FilterValue::Filter(inner) => 1 + inner.depth(),
            FilterValue::Filters(items) => 1 + items.iter().map(Filter::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}

/// JSON shape of a filter before the operand is interpreted
#[derive(Deserialize)]
struct WireFilter {
    #[serde(default)]
    field: String,
    op: Operation,
    #[serde(default)]
    value: serde_json::Value,
}

impl TryFrom<WireFilter> for Filter {
    type Error = Error;

    fn try_from(wire: WireFilter) -> Result<Self, Self::Error> {
        let op = wire.op.name();
        let value = match wire.op {
            Operation::Not => {
                let inner: Filter = serde_json::from_value(wire.value)
                    .map_err(|e| Error::InvalidFilter(format!("{}: {}", op, e)))?;
                FilterValue::Filter(Box::new(inner))
            }
            Operation::And | Operation::Or => {
                let items: Vec<Filter> = serde_json::from_value(wire.value)
                    .map_err(|e| Error::InvalidFilter(format!("{}: {}", op, e)))?;
                FilterValue::Filters(items)
            }
            Operation::In => {
                let items: Vec<Value> = serde_json::from_value(wire.value)
                    .map_err(|e| Error::InvalidFilter(format!("{}: {}", op, e)))?;
                FilterValue::List(items)
            }
            Operation::IsNull => FilterValue::None,
            // Operand is text even when it looks like an address, UUID or timestamp
            Operation::IEq
            | Operation::INe
            | Operation::Contains
            | Operation::IContains
            | Operation::HasPrefix
            | Operation::IHasPrefix
            | Operation::HasSuffix
            | Operation::IHasSuffix
            | Operation::IpWithin => {
                let text: String = serde_json::from_value(wire.value)
                    .map_err(|e| Error::InvalidFilter(format!("{}: {}", op, e)))?;
                FilterValue::Scalar(Value::Text(text))
            }
            _ => {
                let scalar: Value = serde_json::from_value(wire.value)
                    .map_err(|e| Error::InvalidFilter(format!("{}: {}", op, e)))?;
                FilterValue::Scalar(scalar)
            }
        };
        if !wire.op.is_composite() && wire.field.is_empty() {
            return Err(Error::InvalidFilter(format!("{}: missing field", op)));
        }
        Ok(Filter {
            field: wire.field,
            operation: wire.op,
            value,
        })
    }
}
