use clap::{Parser, Subcommand, ValueEnum};

use crate::catalog::CatalogQuery;
use crate::error::ConfigError;
use crate::loader::ImportMode;
use crate::source::DEFAULT_SCHEMA;

#[derive(Debug, Parser)]
#[command(name = "products-mongo", version, about = "Copy product tables from mysql into mongodb and query them")]
pub struct Config {
    /// mysql connection url. `mysql://<user>:<password>@host/db`
    #[arg(long, env = "PRODUCTS_SQL_URL", global = true)]
    pub sql_url: Option<String>,

    /// schema holding the mobiles, headphones and cameras tables
    #[arg(long, env = "PRODUCTS_SQL_SCHEMA", default_value = DEFAULT_SCHEMA, global = true)]
    pub source_schema: String,

    /// mongodb style connection string. `mongodb://<user>:<password>@host.domain`
    #[arg(
        long,
        env = "PRODUCTS_MONGO_URI",
        default_value = "mongodb://localhost:27017",
        global = true
    )]
    pub mongo_uri: String,

    /// the name of the mongodb database
    #[arg(long, env = "PRODUCTS_MONGO_DB", default_value = "pgcdata", global = true)]
    pub database: String,

    /// the name of the mongodb collection
    #[arg(long, env = "PRODUCTS_MONGO_COLLECTION", default_value = "products", global = true)]
    pub collection: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Plain, global = true)]
    pub format: OutputFormat,

    /// keep importing the other categories when one table cannot be read
    #[arg(long, global = true)]
    pub best_effort: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Copy all product tables into the collection.
    Import,
    /// Run one catalog query.
    Query {
        #[arg(value_parser = parse_query)]
        name: CatalogQuery,
    },
    /// Import, then run every catalog query.
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Table,
}

fn parse_query(s: &str) -> Result<CatalogQuery, String> {
    s.parse()
}

impl Config {
    pub fn import_mode(&self) -> ImportMode {
        if self.best_effort {
            ImportMode::BestEffort
        } else {
            ImportMode::FailFast
        }
    }

    pub fn source_url(&self) -> Result<&str, ConfigError> {
        self.sql_url.as_deref().ok_or(ConfigError::MissingSqlUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_flags() {
        let cfg = Config::try_parse_from(["products-mongo", "query", "count"]).unwrap();
        assert!(matches!(
            cfg.command,
            Command::Query {
                name: CatalogQuery::CountByCategory
            }
        ));
        assert_eq!(cfg.format, OutputFormat::Plain);
        assert_eq!(cfg.import_mode(), ImportMode::FailFast);

        let cfg = Config::try_parse_from([
            "products-mongo",
            "import",
            "--best-effort",
            "--sql-url",
            "mysql://root@localhost/pgcdata",
            "--format",
            "table",
        ])
        .unwrap();
        assert_eq!(cfg.import_mode(), ImportMode::BestEffort);
        assert_eq!(cfg.source_url().unwrap(), "mysql://root@localhost/pgcdata");
        assert_eq!(cfg.format, OutputFormat::Table);
    }

    #[test]
    fn rejects_unknown_query() {
        assert!(Config::try_parse_from(["products-mongo", "query", "cheapest"]).is_err());
    }
}
