//! Subcommand handlers

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use filtra::filter;
use filtra::sql::{compile_filter, compile_query};
use filtra::{ColumnMap, Evaluator, Query, Statement};

use crate::cli::Commands;
use crate::config::AppConfig;

pub fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Compile { input, query } => {
            let statement = compile(config, &read_input(&input)?, query)?;
            println!("{}", serde_json::to_string_pretty(&statement)?);
        }
        Commands::Eval { input, data, query } => {
            let rows = load_rows(&data)?;
            let matched = eval(config, &read_input(&input)?, &rows, query)?;
            tracing::debug!(matched = matched.len(), total = rows.len(), "Evaluated");
            println!("{}", serde_json::to_string_pretty(&matched)?);
        }
    }
    Ok(())
}

/// Literal JSON, `@path` for a file, or `-` for stdin
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read input from stdin")?;
        return Ok(text);
    }
    match input.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path))
        }
        None => Ok(input.to_string()),
    }
}

fn load_rows(path: &Path) -> Result<Vec<ColumnMap>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse data file: {}", path.display()))
}

fn parse_query(text: &str, as_query: bool) -> Result<Query> {
    if as_query {
        return filter::parse_query(text).context("Invalid query JSON");
    }
    Ok(Query::filtered(filter::parse_filter(text)?))
}

/// Fields referenced by the filter and the order keys
fn query_fields(query: &Query) -> Vec<&str> {
    let mut fields = query.filter.as_ref().map(|f| f.fields()).unwrap_or_default();
    fields.extend(query.order.iter().map(|o| o.field.as_str()));
    fields
}

pub fn compile(config: &AppConfig, text: &str, as_query: bool) -> Result<Statement> {
    let dialect = config.dialect.dialect();
    if as_query {
        let query = parse_query(text, true)?;
        let mapping = config.mapping_for(query_fields(&query))?;
        return Ok(compile_query(dialect.as_ref(), &mapping, &config.select(), &query)?);
    }
    let parsed = filter::parse_filter(text)?;
    let mapping = config.mapping_for(parsed.fields())?;
    Ok(compile_filter(dialect.as_ref(), &mapping, &parsed)?)
}

pub fn eval(
    config: &AppConfig,
    text: &str,
    rows: &[ColumnMap],
    as_query: bool,
) -> Result<Vec<ColumnMap>> {
    let query = parse_query(text, as_query)?;
    let mapping = config.mapping_for(query_fields(&query))?;
    let evaluator = Evaluator::for_dialect(config.dialect.dialect().as_ref());
    let selected = evaluator.select(&mapping, &query, rows)?;
    Ok(selected.into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filtra::{DialectKind, Mapping, Value};
    use std::io::Write;

    fn config(dialect: DialectKind) -> AppConfig {
        AppConfig {
            dialect,
            table: "users".into(),
            mapping: None,
        }
    }

    fn rows() -> Vec<ColumnMap> {
        serde_json::from_str(
            r#"[
                { "name": "Alice", "age": 23, "ip_address": "192.168.1.1" },
                { "name": "Bob", "age": 27, "ip_address": "192.168.1.2" },
                { "name": "Eve", "age": 36, "ip_address": "192.168.2.1" }
            ]"#,
        )
        .unwrap()
    }

    fn names(rows: &[ColumnMap]) -> Vec<&str> {
        rows.iter().filter_map(|r| r["name"].as_text()).collect()
    }

    #[test]
    fn test_compile_filter() {
        let statement = compile(
            &config(DialectKind::Postgres),
            r#"{"op":"And","value":[{"field":"name","op":"Eq","value":"Bob"},{"field":"age","op":">","value":20}]}"#,
            false,
        )
        .unwrap();
        assert_eq!(statement.sql, "(name = $1) AND (age > $2)");
        assert_eq!(statement.params, vec![Value::from("Bob"), Value::Int(20)]);
    }

    #[test]
    fn test_compile_query_with_mapping() {
        let config = AppConfig {
            mapping: Some(Mapping::new([("name", "user_name"), ("age", "user_age")]).unwrap()),
            ..config(DialectKind::Sqlite)
        };
        let statement = compile(
            &config,
            r#"{"filter":{"field":"age","op":"Gte","value":18},"limit":10,"order":[{"field":"name"}]}"#,
            true,
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            "SELECT user_name, user_age FROM users WHERE user_age >= ? ORDER BY user_name LIMIT 10"
        );
    }

    #[test]
    fn test_compile_reports_unsupported_operation() {
        let err = compile(
            &config(DialectKind::Sqlite),
            r#"{"field":"ip","op":"IPWithin","value":"10.0.0.0/8"}"#,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("IPWithin"));
    }

    #[test]
    fn test_eval_filter_and_query() {
        let rows = rows();
        let config = config(DialectKind::Generic);

        let matched = eval(
            &config,
            r#"{"field":"ip_address","op":"IPWithin","value":"192.168.1.0/24"}"#,
            &rows,
            false,
        )
        .unwrap();
        assert_eq!(names(&matched), vec!["Alice", "Bob"]);

        let matched = eval(
            &config,
            r#"{"limit":2,"order":[{"field":"age","desc":true}]}"#,
            &rows,
            true,
        )
        .unwrap();
        assert_eq!(names(&matched), vec!["Eve", "Bob"]);
    }

    #[test]
    fn test_query_filter_depth_is_limited() {
        let mut inner = r#"{"field":"age","op":"IsNull"}"#.to_string();
        for _ in 0..filtra::filter::MAX_FILTER_DEPTH {
            inner = format!(r#"{{"op":"Not","value":{}}}"#, inner);
        }
        let query = format!(r#"{{"filter":{}}}"#, inner);
        let err = compile(&config(DialectKind::Generic), &query, true).unwrap_err();
        assert!(format!("{:#}", err).contains("nesting depth"));
        let err = eval(&config(DialectKind::Generic), &query, &rows(), true).unwrap_err();
        assert!(format!("{:#}", err).contains("nesting depth"));
    }

    #[test]
    fn test_eval_text_operations_on_address_cells() {
        let matched = eval(
            &config(DialectKind::Generic),
            r#"{"field":"ip_address","op":"HasPrefix","value":"192.168.1."}"#,
            &rows(),
            false,
        )
        .unwrap();
        assert_eq!(names(&matched), vec!["Alice", "Bob"]);

        let statement = compile(
            &config(DialectKind::Sqlite),
            r#"{"field":"ip_address","op":"HasPrefix","value":"10.0.0.1"}"#,
            false,
        )
        .unwrap();
        assert_eq!(statement.sql, "ip_address LIKE ? ESCAPE '\\'");
        assert_eq!(statement.params, vec![Value::from("10.0.0.1%")]);
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"field":"age","op":"Lt","value":30}"#).unwrap();
        let text = read_input(&format!("@{}", file.path().display())).unwrap();
        assert!(text.contains("\"Lt\""));
        assert_eq!(read_input("{}").unwrap(), "{}");
        assert!(read_input("@/definitely/missing.json").is_err());
    }

    #[test]
    fn test_load_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"name":"Alice","age":23}]"#).unwrap();
        let rows = load_rows(file.path()).unwrap();
        assert_eq!(rows[0]["age"], Value::Int(23));
    }
}
