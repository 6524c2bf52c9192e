use thiserror::Error;

use crate::category::Category;

/// Failures while reading rows from the relational source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unable to start sql runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error("source table '{0}' does not exist")]
    MissingTable(String),
}

/// Failures talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
    #[error("unable to connect to mongodb: {0}")]
    Connect(String),
    #[error("unsupported {kind}: {detail}")]
    Unsupported { kind: &'static str, detail: String },
}

impl StoreError {
    pub(crate) fn unsupported(kind: &'static str, detail: impl Into<String>) -> Self {
        StoreError::Unsupported {
            kind,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("reading {category} failed: {source}")]
    Source {
        category: Category,
        #[source]
        source: SourceError,
    },
    #[error("writing products failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no sql url given, pass --sql-url or set PRODUCTS_SQL_URL")]
    MissingSqlUrl,
}
