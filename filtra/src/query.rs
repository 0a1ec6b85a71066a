//! Queries: a filter plus pagination and ordering

use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub field: String,
    #[serde(default)]
    pub desc: bool,
}

/// Ascending order by a field
pub fn asc(field: impl Into<String>) -> Order {
    Order {
        field: field.into(),
        desc: false,
    }
}

/// Descending order by a field
pub fn desc(field: impl Into<String>) -> Order {
    Order {
        field: field.into(),
        desc: true,
    }
}

/// Filter with pagination and ordering
///
/// `limit == 0` is unbounded and `offset == 0` skips nothing. Without a filter
/// every record matches. Order keys apply in list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching a filter
    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Replace the ordering
    pub fn order_by(mut self, order: impl IntoIterator<Item = Order>) -> Self {
        self.order = order.into_iter().collect();
        self
    }
}
