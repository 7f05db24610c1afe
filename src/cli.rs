//! CLI argument parsing for the sales-loader binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::TargetDatabase;

#[derive(Parser)]
#[command(name = "sales-loader", about = "Bulk data loader for the sales console databases")]
pub struct Cli {
    /// Override the API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Override the number of rows per upload request
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write an example CSV for a target's loader
    Template {
        #[arg(long, value_enum)]
        target: TargetDatabase,
        /// Directory to write the template into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Comma-separated column list, required for targets without a loader schema
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },
    /// Parse a file and dry-run it against the backend
    Validate {
        #[arg(long, value_enum)]
        target: TargetDatabase,
        file: PathBuf,
    },
    /// Parse, dry-run and upload a file in chunks
    Import {
        #[arg(long, value_enum)]
        target: TargetDatabase,
        file: PathBuf,
        /// First chunk to upload (1-based), for resuming a partial import
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        resume_from: Option<u64>,
    },
    /// Convert adapter records to the uniform form shape
    Normalize {
        #[arg(long, value_enum)]
        target: TargetDatabase,
        #[arg(long, value_enum)]
        entity: Entity,
        /// JSON file holding an array of records or `{"data": [...]}`
        file: PathBuf,
    },
    /// Build each target's create payload from uniform forms
    Payload {
        #[arg(long, value_enum)]
        target: TargetDatabase,
        #[arg(long, value_enum)]
        entity: Entity,
        /// JSON file holding one form, an array of forms or `{"data": [...]}`
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Entity {
    Clientes,
    Productos,
    Ordenes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_template_command_parses() {
        let cli = Cli::parse_from(["sales-loader", "template", "--target", "mssql"]);
        match cli.command {
            Command::Template { target, out_dir, columns } => {
                assert_eq!(target, TargetDatabase::Mssql);
                assert_eq!(out_dir, PathBuf::from("."));
                assert!(columns.is_none());
            }
            _ => panic!("expected template"),
        }
    }

    #[test]
    fn test_cli_template_columns_split_on_commas() {
        let cli = Cli::parse_from([
            "sales-loader", "template", "--target", "neo4j", "--columns", "nombre,email",
        ]);
        assert!(matches!(
            cli.command,
            Command::Template { columns: Some(ref c), .. } if c == &["nombre", "email"]
        ));
    }

    #[test]
    fn test_cli_import_with_globals() {
        let cli = Cli::parse_from([
            "sales-loader", "import", "--target", "mysql", "ventas.csv",
            "--resume-from", "2", "--chunk-size", "100", "--api-url", "http://otro:8000",
        ]);
        assert_eq!(cli.chunk_size, Some(100));
        assert_eq!(cli.api_url.as_deref(), Some("http://otro:8000"));
        assert!(matches!(
            cli.command,
            Command::Import { target: TargetDatabase::Mysql, resume_from: Some(2), .. }
        ));
    }

    #[test]
    fn test_cli_rejects_zero_resume_point() {
        let result = Cli::try_parse_from([
            "sales-loader", "import", "--target", "mysql", "ventas.csv", "--resume-from", "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_normalize_parses_entity() {
        let cli = Cli::parse_from([
            "sales-loader", "normalize", "--target", "neo4j", "--entity", "ordenes", "ordenes.json",
        ]);
        assert!(matches!(
            cli.command,
            Command::Normalize { entity: Entity::Ordenes, target: TargetDatabase::Neo4j, .. }
        ));
    }

    #[test]
    fn test_cli_payload_parses_target_and_entity() {
        let cli = Cli::parse_from([
            "sales-loader", "payload", "--target", "mysql", "--entity", "ordenes", "orden.json",
        ]);
        match cli.command {
            Command::Payload { target, entity, file } => {
                assert_eq!(target, TargetDatabase::Mysql);
                assert_eq!(entity, Entity::Ordenes);
                assert_eq!(file, PathBuf::from("orden.json"));
            }
            _ => panic!("expected payload"),
        }
    }

    #[test]
    fn test_cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["sales-loader"]).is_err());
    }
}
