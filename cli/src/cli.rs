use clap::{Parser, Subcommand};

use std::path::PathBuf;

use filtra::DialectKind;

use crate::constants::{ENV_CONFIG, ENV_DIALECT, ENV_TABLE};

#[derive(Parser)]
#[command(name = "filtra")]
#[command(
    version,
    about = "Compile portable filters to SQL or evaluate them in memory",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQL dialect (generic, sqlite, mysql, postgres, clickhouse)
    #[arg(long, short = 'd', global = true, env = ENV_DIALECT, value_parser = parse_dialect)]
    pub dialect: Option<DialectKind>,

    /// Table the statements target
    #[arg(long, short = 't', global = true, env = ENV_TABLE)]
    pub table: Option<String>,
}

/// Parse dialect from CLI/env string
fn parse_dialect(s: &str) -> Result<DialectKind, String> {
    s.parse::<DialectKind>().map_err(|_| {
        format!(
            "Invalid dialect '{}'. Valid options: generic, sqlite, mysql, postgres, clickhouse",
            s
        )
    })
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile a filter to a WHERE clause, or a query to a SELECT statement
    Compile {
        /// Filter JSON, `@path` to read it from a file, or `-` for stdin
        input: String,

        /// Read the input as a query (filter, limit, offset, order)
        #[arg(long, short = 'q')]
        query: bool,
    },
    /// Evaluate a filter or query against rows from a JSON file
    Eval {
        /// Filter JSON, `@path` to read it from a file, or `-` for stdin
        input: String,

        /// JSON array of row objects keyed by column name
        #[arg(long)]
        data: PathBuf,

        /// Read the input as a query (filter, limit, offset, order)
        #[arg(long, short = 'q')]
        query: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub dialect: Option<DialectKind>,
    pub table: Option<String>,
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            dialect: cli.dialect,
            table: cli.table.clone(),
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    (CliConfig::from(&cli), cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_with_globals() {
        let cli = Cli::try_parse_from([
            "filtra",
            "compile",
            r#"{"field":"age","op":"Gt","value":3}"#,
            "--dialect",
            "pg",
            "-t",
            "users",
        ])
        .unwrap();
        let config = CliConfig::from(&cli);
        assert_eq!(config.dialect, Some(DialectKind::Postgres));
        assert_eq!(config.table.as_deref(), Some("users"));
        assert!(matches!(cli.command, Commands::Compile { query: false, .. }));
    }

    #[test]
    fn test_parse_eval_requires_data() {
        assert!(Cli::try_parse_from(["filtra", "eval", "{}"]).is_err());
        let cli = Cli::try_parse_from(["filtra", "eval", "-q", "@q.json", "--data", "rows.json"])
            .unwrap();
        match cli.command {
            Commands::Eval { input, data, query } => {
                assert_eq!(input, "@q.json");
                assert_eq!(data, PathBuf::from("rows.json"));
                assert!(query);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_dialect_rejects_unknown() {
        assert!(parse_dialect("oracle").is_err());
        assert_eq!(parse_dialect("SQLite3").unwrap(), DialectKind::Sqlite);
    }
}
