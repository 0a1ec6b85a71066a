//! Filter parsing
//!
//! Parses JSON filter and query definitions with size and nesting limits.

use super::types::Filter;
use crate::error::Error;
use crate::query::Query;

/// Maximum size of filter JSON in bytes (64KB)
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum nesting depth of composite filters
pub const MAX_FILTER_DEPTH: usize = 32;

/// Parse a filter from its JSON wire form
pub fn parse_filter(json_str: &str) -> Result<Filter, Error> {
    check_size(json_str)?;
    let filter: Filter =
        serde_json::from_str(json_str).map_err(|e| Error::InvalidFilter(e.to_string()))?;
    let depth = check_depth(&filter)?;
    tracing::trace!(depth, "Parsed filter");
    Ok(filter)
}

/// Parse a query (`filter`, `limit`, `offset`, `order`) from JSON
///
/// The embedded filter is held to the same limits as [`parse_filter`].
pub fn parse_query(json_str: &str) -> Result<Query, Error> {
    check_size(json_str)?;
    let query: Query = serde_json::from_str(json_str)
        .map_err(|e| Error::InvalidFilter(format!("query: {}", e)))?;
    if let Some(filter) = &query.filter {
        let depth = check_depth(filter)?;
        tracing::trace!(depth, "Parsed query filter");
    }
    Ok(query)
}

fn check_size(json_str: &str) -> Result<(), Error> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(Error::InvalidFilter(format!(
            "filter JSON exceeds maximum size of {} bytes",
            MAX_FILTER_JSON_SIZE
        )));
    }
    Ok(())
}

fn check_depth(filter: &Filter) -> Result<usize, Error> {
    let depth = filter.depth();
    if depth > MAX_FILTER_DEPTH {
        return Err(Error::InvalidFilter(format!(
            "filter nesting depth {} exceeds maximum of {}",
            depth, MAX_FILTER_DEPTH
        )));
    }
    Ok(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Operation, eq};

    #[test]
    fn parse_filter_valid_json() {
        let filter = parse_filter(r#"{"field": "name", "op": "Eq", "value": "Bob"}"#).unwrap();
        assert_eq!(filter, eq("name", "Bob"));
    }

    #[test]
    fn parse_filter_invalid_json() {
        let result = parse_filter("not json");
        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn parse_filter_too_large() {
        let padding = " ".repeat(MAX_FILTER_JSON_SIZE);
        let json = format!(r#"{{"field": "a", "op": "Eq", "value": 1}}{}"#, padding);
        let err = parse_filter(&json).unwrap_err();
        assert!(err.to_string().contains("maximum size"));
    }

    #[test]
    fn parse_filter_too_deep() {
        let mut json = r#"{"field": "a", "op": "IsNull"}"#.to_string();
        for _ in 0..MAX_FILTER_DEPTH {
            json = format!(r#"{{"op": "Not", "value": {}}}"#, json);
        }
        let err = parse_filter(&json).unwrap_err();
        assert!(err.to_string().contains("nesting depth"));
    }

    #[test]
    fn parse_filter_nested_at_limit() {
        let mut json = r#"{"field": "a", "op": "IsNull"}"#.to_string();
        for _ in 1..MAX_FILTER_DEPTH {
            json = format!(r#"{{"op": "Not", "value": {}}}"#, json);
        }
        let filter = parse_filter(&json).unwrap();
        assert_eq!(filter.operation, Operation::Not);
        assert_eq!(filter.depth(), MAX_FILTER_DEPTH);
    }

    #[test]
    fn parse_query_with_filter() {
        let query = parse_query(
            r#"{"filter": {"field": "name", "op": "Eq", "value": "Bob"}, "limit": 5}"#,
        )
        .unwrap();
        assert_eq!(query.filter, Some(eq("name", "Bob")));
        assert_eq!(query.limit, 5);
        assert!(parse_query(r#"{"limit": 2}"#).unwrap().filter.is_none());
    }

    #[test]
    fn parse_query_enforces_filter_limits() {
        let mut json = r#"{"field": "a", "op": "IsNull"}"#.to_string();
        for _ in 0..MAX_FILTER_DEPTH {
            json = format!(r#"{{"op": "Not", "value": {}}}"#, json);
        }
        let err = parse_query(&format!(r#"{{"filter": {}}}"#, json)).unwrap_err();
        assert!(err.to_string().contains("nesting depth"));

        let padding = " ".repeat(MAX_FILTER_JSON_SIZE);
        let err = parse_query(&format!(r#"{{"limit": 1}}{}"#, padding)).unwrap_err();
        assert!(err.to_string().contains("maximum size"));

        assert!(matches!(parse_query("[]"), Err(Error::InvalidFilter(_))));
    }
}
