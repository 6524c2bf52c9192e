use mongodb::bson::Document;
use tracing::{error, info, warn};

use crate::category::Category;
use crate::error::{ImportError, SourceError};
use crate::mapper::map_rows;
use crate::source::RowSource;
use crate::store::ProductStore;

/// What to do when one category cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Abort before anything is written.
    #[default]
    FailFast,
    /// Log the failure and insert whatever the other categories produced.
    BestEffort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub mobiles: usize,
    pub headphones: usize,
    pub cameras: usize,
    pub inserted: usize,
    pub failed: Vec<Category>,
}

impl ImportReport {
    pub fn rows(&self, category: Category) -> usize {
        match category {
            Category::Mobiles => self.mobiles,
            Category::Headphones => self.headphones,
            Category::Cameras => self.cameras,
        }
    }

    fn set_rows(&mut self, category: Category, n: usize) {
        match category {
            Category::Mobiles => self.mobiles = n,
            Category::Headphones => self.headphones = n,
            Category::Cameras => self.cameras = n,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.mobiles + self.headphones + self.cameras
    }
}

/// Read every category table, map the rows and write them with a single
/// `insert_many`. Running it twice inserts everything twice.
pub fn import_products(
    source: &mut dyn RowSource,
    store: &dyn ProductStore,
    mode: ImportMode,
) -> Result<ImportReport, ImportError> {
    let mut report = ImportReport::default();
    let mut documents: Vec<Document> = Vec::new();

    for category in Category::ALL {
        let rows = match source.fetch_rows(category) {
            Ok(rows) => rows,
            Err(e) => match mode {
                ImportMode::FailFast => return Err(source_error(category, e)),
                ImportMode::BestEffort => {
                    error!(%category, error = %e, "skipping category");
                    report.failed.push(category);
                    continue;
                }
            },
        };
        info!(%category, rows = rows.len(), "read source rows");
        report.set_rows(category, rows.len());
        documents.extend(map_rows(category, &rows));
    }

    if documents.is_empty() {
        warn!("no source rows, nothing to insert");
        return Ok(report);
    }

    report.inserted = store.insert_many(documents)?;
    info!(
        inserted = report.inserted,
        failed = report.failed.len(),
        "import finished"
    );
    Ok(report)
}

fn source_error(category: Category, source: SourceError) -> ImportError {
    ImportError::Source { category, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemorySource, SourceRow};
    use crate::store::MemoryStore;

    #[test]
    fn empty_tables_skip_the_insert() {
        let mut source = MemorySource::new()
            .with_table(Category::Mobiles, vec![])
            .with_table(Category::Headphones, vec![])
            .with_table(Category::Cameras, vec![]);
        let store = MemoryStore::new();
        let report = import_products(&mut source, &store, ImportMode::FailFast).unwrap();
        assert_eq!(report, ImportReport::default());
        assert!(store.is_empty());
    }

    #[test]
    fn report_counts_per_category() {
        let row = || SourceRow::new().with("ProductId", "x");
        let mut source = MemorySource::new()
            .with_table(Category::Mobiles, vec![row()])
            .with_table(Category::Headphones, vec![row(), row()])
            .with_table(Category::Cameras, vec![row(), row(), row()]);
        let store = MemoryStore::new();
        let report = import_products(&mut source, &store, ImportMode::default()).unwrap();
        assert_eq!(report.rows(Category::Headphones), 2);
        assert_eq!(report.total_rows(), 6);
        assert_eq!(report.inserted, 6);
        assert!(report.failed.is_empty());
    }
}
