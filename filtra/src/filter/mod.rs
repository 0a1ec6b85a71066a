//! Portable filter expressions
//!
//! Filters are built once with the constructor functions and handed to either
//! the SQL compiler or the in-memory evaluator.
//!
//! ## Usage
//!
//! ```
//! use filtra::filter::{and, eq, has_prefix, not, parse_filter};
//!
//! let filter = and([eq("active", true), not(has_prefix("name", "A"))]);
//! let json = serde_json::to_string(&filter).unwrap();
//! assert_eq!(parse_filter(&json).unwrap(), filter);
//! ```

mod builder;
mod parser;
mod subnet;
mod types;
mod value;

pub use builder::{
    and, contains, eq, gt, gte, has_prefix, has_suffix, icontains, ieq, ihas_prefix, ihas_suffix,
    ine, ip_within, is_in, is_null, lt, lte, ne, not, or,
};
pub use parser::{MAX_FILTER_DEPTH, MAX_FILTER_JSON_SIZE, parse_filter, parse_query};
pub use subnet::Subnet;
pub use types::{Filter, FilterValue, Operation};
pub use value::{FromValue, Value, parse_timestamp};
