//! Target databases behind the sales console REST API

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the interchangeable backend adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetDatabase {
    /// Document store
    Mongo,
    /// Relational, PascalCase schema keyed by SKU
    Mssql,
    /// Relational, snake_case schema keyed by alternate code
    Mysql,
    /// Managed Postgres
    Supabase,
    /// Graph database
    #[value(name = "neo4j")]
    Neo4j,
}

const MSSQL_LOADER_COLUMNS: &[&str] = &[
    "ClienteEmail",
    "ClienteNombre",
    "SKU",
    "CodigoAlt",
    "Fecha",
    "Canal",
    "Moneda",
    "Qty",
    "PrecioUnit",
    "DescuentoPct",
    "MetadataJSON",
];

const MYSQL_LOADER_COLUMNS: &[&str] = &[
    "cliente_email",
    "producto_codigo_alt",
    "fecha",
    "canal",
    "moneda",
    "total",
    "precio_unit",
    "cantidad",
    "metadata",
];

impl TargetDatabase {
    /// Path segment used by the REST API
    pub fn slug(&self) -> &'static str {
        match self {
            TargetDatabase::Mongo => "mongo",
            TargetDatabase::Mssql => "mssql",
            TargetDatabase::Mysql => "mysql",
            TargetDatabase::Supabase => "supabase",
            TargetDatabase::Neo4j => "neo4j",
        }
    }

    /// Columns the bulk loader expects, for targets that have a loader
    pub fn loader_columns(&self) -> Option<&'static [&'static str]> {
        match self {
            TargetDatabase::Mssql => Some(MSSQL_LOADER_COLUMNS),
            TargetDatabase::Mysql => Some(MYSQL_LOADER_COLUMNS),
            _ => None,
        }
    }

    pub fn template_filename(&self) -> String {
        format!("{}_loader_template.csv", self.slug())
    }
}

impl fmt::Display for TargetDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_slugs_are_unique_and_lowercase() {
        let mut slugs: Vec<_> = TargetDatabase::value_variants().iter().map(|t| t.slug()).collect();
        assert!(slugs.iter().all(|s| s.chars().all(|c| !c.is_uppercase())));
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 5);
    }

    #[test]
    fn test_relational_loaders_use_different_product_references() {
        let mssql = TargetDatabase::Mssql.loader_columns().unwrap();
        let mysql = TargetDatabase::Mysql.loader_columns().unwrap();
        assert!(mssql.contains(&"SKU"));
        assert!(mysql.contains(&"producto_codigo_alt"));
        assert!(!mysql.contains(&"SKU"));
    }

    #[test]
    fn test_only_relational_targets_have_loaders() {
        assert!(TargetDatabase::Mongo.loader_columns().is_none());
        assert!(TargetDatabase::Supabase.loader_columns().is_none());
        assert!(TargetDatabase::Neo4j.loader_columns().is_none());
    }

    #[test]
    fn test_template_filename() {
        assert_eq!(TargetDatabase::Mssql.template_filename(), "mssql_loader_template.csv");
    }

    #[test]
    fn test_serde_uses_slug() {
        let json = serde_json::to_string(&TargetDatabase::Neo4j).unwrap();
        assert_eq!(json, "\"neo4j\"");
    }
}
