use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use filtra::{DialectKind, Mapping};

use crate::cli::CliConfig;
use crate::constants::{CONFIG_FILE_NAME, DEFAULT_TABLE};

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub dialect: Option<DialectKind>,
    pub table: Option<String>,
    /// Field name → column name, in select order
    pub mapping: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    fn mapping(&self) -> Result<Option<Mapping>> {
        let Some(map) = &self.mapping else {
            return Ok(None);
        };
        let mut pairs = Vec::with_capacity(map.len());
        for (field, column) in map {
            let column = column
                .as_str()
                .with_context(|| format!("mapping.{} must be a column name string", field))?;
            pairs.push((field.as_str(), column));
        }
        let mapping = Mapping::new(pairs).context("Invalid mapping in config file")?;
        Ok(Some(mapping))
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dialect: DialectKind,
    pub table: String,
    /// Configured mapping; `None` maps every field to a column of the same name
    pub mapping: Option<Mapping>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let path = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.exists() { Some(local) } else { None }
            }
        };

        let file_config = match path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        let mapping = file_config.mapping()?;
        let dialect = cli.dialect.or(file_config.dialect).unwrap_or_default();
        let table = cli
            .table
            .clone()
            .or(file_config.table)
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        if table.trim().is_empty() {
            anyhow::bail!("Table name must not be empty");
        }

        tracing::debug!(%dialect, table = %table, mapped = mapping.is_some(), "Configuration loaded");
        Ok(Self {
            dialect,
            table,
            mapping,
        })
    }

    /// Configured mapping, or an identity mapping over the given fields
    pub fn mapping_for<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Result<Mapping> {
        if let Some(mapping) = &self.mapping {
            return Ok(mapping.clone());
        }
        let mut names: Vec<&str> = Vec::new();
        for field in fields {
            if !names.contains(&field) {
                names.push(field);
            }
        }
        if names.is_empty() {
            // Field-less filters still need a non-empty mapping
            names.push("*");
        }
        Mapping::new(names.into_iter().map(|f| (f, f))).context("Invalid field names")
    }

    /// SELECT head used for query statements
    pub fn select(&self) -> String {
        match &self.mapping {
            Some(mapping) => format!(
                "SELECT {} FROM {}",
                mapping.columns().collect::<Vec<_>>().join(", "),
                self.table
            ),
            None => format!("SELECT * FROM {}", self.table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn cli_with(path: &Path) -> CliConfig {
        CliConfig {
            config: Some(path.to_path_buf()),
            ..CliConfig::default()
        }
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "dialect": "mysql", "tabel": "users" }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dialect, Some(DialectKind::Mysql));
        assert!(config.table.is_none());
        assert_eq!(config.extra["tabel"], "users");
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"{ "dialect": "postgres", "table": "users",
                 "mapping": { "name": "user_name", "age": "user_age" } }"#,
        );
        let config = AppConfig::load(&cli_with(file.path())).unwrap();
        assert_eq!(config.dialect, DialectKind::Postgres);
        assert_eq!(config.table, "users");
        assert_eq!(config.select(), "SELECT user_name, user_age FROM users");
        let mapping = config.mapping_for(["ignored"]).unwrap();
        assert_eq!(mapping.column("age").unwrap(), "user_age");
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config(r#"{ "dialect": "postgres", "table": "users" }"#);
        let cli = CliConfig {
            dialect: Some(DialectKind::Clickhouse),
            table: Some("events".into()),
            ..cli_with(file.path())
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.dialect, DialectKind::Clickhouse);
        assert_eq!(config.table, "events");
        assert!(config.mapping.is_none());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&cli_with(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_mapping() {
        let file = write_config(r#"{ "mapping": { "name": 3 } }"#);
        assert!(AppConfig::load(&cli_with(file.path())).is_err());

        let file = write_config(r#"{ "mapping": { "a": "col", "b": "col" } }"#);
        assert!(AppConfig::load(&cli_with(file.path())).is_err());
    }

    #[test]
    fn test_identity_mapping_dedups_fields() {
        let config = AppConfig {
            dialect: DialectKind::Generic,
            table: "t".into(),
            mapping: None,
        };
        let mapping = config.mapping_for(["age", "name", "age"]).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(config.select(), "SELECT * FROM t");
    }
}
