use std::collections::HashMap;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::category::Category;
use crate::error::SourceError;

pub const DEFAULT_SCHEMA: &str = "pgcdata";

/// One relational record, every cell carried as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    cells: Vec<(String, Option<String>)>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, Some(value.into()));
        self
    }

    pub fn with_null(mut self, column: impl Into<String>) -> Self {
        self.push(column, None);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        self.cells.push((column.into(), value));
    }

    /// Text of `column`, `None` when the column is absent or `NULL`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for SourceRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        SourceRow {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }
}

/// Reads all rows of a category's table.
pub trait RowSource {
    fn fetch_rows(&mut self, category: Category) -> Result<Vec<SourceRow>, SourceError>;
}

pub fn select_all_sql(schema: &str, category: Category) -> String {
    format!("SELECT * FROM {}.{}", schema, category.table())
}

/// MySQL source. sqlx is async, so the source owns a small runtime and blocks on it.
pub struct MySqlSource {
    runtime: Runtime,
    pool: MySqlPool,
    schema: String,
}

impl MySqlSource {
    pub fn connect(url: &str, schema: impl Into<String>) -> Result<Self, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let pool = runtime.block_on(MySqlPoolOptions::new().max_connections(1).connect(url))?;
        Ok(MySqlSource {
            runtime,
            pool,
            schema: schema.into(),
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    // raw sql runs over the text protocol, so every column decodes as a string
    fn parse_row(row: &MySqlRow) -> Result<SourceRow, SourceError> {
        let mut out = SourceRow::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let value: Option<String> = row.try_get_unchecked(idx)?;
            out.push(column.name(), value);
        }
        Ok(out)
    }
}

impl RowSource for MySqlSource {
    fn fetch_rows(&mut self, category: Category) -> Result<Vec<SourceRow>, SourceError> {
        let sql = select_all_sql(&self.schema, category);
        debug!(%category, %sql, "executing source query");
        let rows = self
            .runtime
            .block_on(sqlx::raw_sql(&sql).fetch_all(&self.pool))?;
        rows.iter().map(Self::parse_row).collect()
    }
}

impl Drop for MySqlSource {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

/// Tables held in memory, keyed by category.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<Category, Vec<SourceRow>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, category: Category, rows: Vec<SourceRow>) -> Self {
        self.tables.insert(category, rows);
        self
    }

    pub fn insert_row(&mut self, category: Category, row: SourceRow) {
        self.tables.entry(category).or_default().push(row);
    }
}

impl RowSource for MemorySource {
    fn fetch_rows(&mut self, category: Category) -> Result<Vec<SourceRow>, SourceError> {
        self.tables
            .get(&category)
            .cloned()
            .ok_or_else(|| SourceError::MissingTable(category.table().to_string()))
    }
}
