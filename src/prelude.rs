pub use crate::catalog::{run_all, CatalogQuery};
pub use crate::category::Category;
pub use crate::error::{ConfigError, ImportError, SourceError, StoreError};
pub use crate::loader::{import_products, ImportMode, ImportReport};
pub use crate::mapper::{map_row, map_rows};
pub use crate::printer::{ConsolePrinter, ProductPrinter, TablePrinter};
pub use crate::source::{MemorySource, MySqlSource, RowSource, SourceRow};
pub use crate::store::{FindSpec, MemoryStore, MongoStore, ProductStore};
