//! The fixed read queries run against the product collection.

use std::fmt;
use std::str::FromStr;

use mongodb::bson::{doc, Document};
use tracing::debug;

use crate::category::{Category, CATEGORY_FIELD, CONNECTOR_TYPE_FIELD, COUNT_FIELD, ID_FIELD};
use crate::error::StoreError;
use crate::printer::ProductPrinter;
use crate::store::{FindSpec, ProductStore};

pub const TOP_MOBILES_LIMIT: i64 = 5;
pub const WIRED: &str = "Wired";

pub fn category_filter(category: Category) -> Document {
    doc! { CATEGORY_FIELD: category.label() }
}

pub fn top_mobiles_spec() -> FindSpec {
    FindSpec::default().with_limit(TOP_MOBILES_LIMIT)
}

pub fn by_category_desc_spec() -> FindSpec {
    FindSpec::default()
        .with_sort(doc! { CATEGORY_FIELD: -1 })
        .with_projection(doc! { ID_FIELD: 0 })
}

pub fn count_by_category_pipeline() -> Vec<Document> {
    vec![doc! {
        "$group": {
            ID_FIELD: format!("${}", CATEGORY_FIELD),
            COUNT_FIELD: { "$sum": 1 },
        }
    }]
}

pub fn wired_headphones_filter() -> Document {
    doc! {
        "$and": [
            category_filter(Category::Headphones),
            { CONNECTOR_TYPE_FIELD: WIRED },
        ]
    }
}

pub fn display_all_products(
    store: &dyn ProductStore,
    printer: &mut dyn ProductPrinter,
) -> Result<(), StoreError> {
    printer.heading(CatalogQuery::AllProducts.title());
    for doc in store.find(None, FindSpec::default())? {
        printer.print_common_attributes(&doc);
    }
    printer.finish();
    Ok(())
}

pub fn display_top_mobiles(
    store: &dyn ProductStore,
    printer: &mut dyn ProductPrinter,
) -> Result<(), StoreError> {
    printer.heading(CatalogQuery::TopMobiles.title());
    let docs = store.find(Some(category_filter(Category::Mobiles)), top_mobiles_spec())?;
    for doc in &docs {
        printer.print_all_attributes(doc);
    }
    printer.finish();
    Ok(())
}

pub fn display_products_by_category_desc(
    store: &dyn ProductStore,
    printer: &mut dyn ProductPrinter,
) -> Result<(), StoreError> {
    printer.heading(CatalogQuery::ByCategoryDesc.title());
    for doc in store.find(None, by_category_desc_spec())? {
        printer.print_all_attributes(&doc);
    }
    printer.finish();
    Ok(())
}

pub fn display_product_count_by_category(
    store: &dyn ProductStore,
    printer: &mut dyn ProductPrinter,
) -> Result<(), StoreError> {
    printer.heading(CatalogQuery::CountByCategory.title());
    for doc in store.aggregate(count_by_category_pipeline())? {
        printer.print_category_count(&doc);
    }
    printer.finish();
    Ok(())
}

pub fn display_wired_headphones(
    store: &dyn ProductStore,
    printer: &mut dyn ProductPrinter,
) -> Result<(), StoreError> {
    printer.heading(CatalogQuery::WiredHeadphones.title());
    for doc in store.find(Some(wired_headphones_filter()), FindSpec::default())? {
        printer.print_all_attributes(&doc);
    }
    printer.finish();
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogQuery {
    AllProducts,
    TopMobiles,
    ByCategoryDesc,
    CountByCategory,
    WiredHeadphones,
}

impl CatalogQuery {
    pub const ALL: [CatalogQuery; 5] = [
        CatalogQuery::AllProducts,
        CatalogQuery::TopMobiles,
        CatalogQuery::ByCategoryDesc,
        CatalogQuery::CountByCategory,
        CatalogQuery::WiredHeadphones,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CatalogQuery::AllProducts => "all",
            CatalogQuery::TopMobiles => "top-mobiles",
            CatalogQuery::ByCategoryDesc => "by-category",
            CatalogQuery::CountByCategory => "count",
            CatalogQuery::WiredHeadphones => "wired-headphones",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CatalogQuery::AllProducts => "Displaying All Products",
            CatalogQuery::TopMobiles => "Displaying Top 5 Mobiles",
            CatalogQuery::ByCategoryDesc => "Displaying Products ordered by categories",
            CatalogQuery::CountByCategory => "Displaying Product Count by categories",
            CatalogQuery::WiredHeadphones => "Displaying Wired headphones",
        }
    }

    pub fn run(
        &self,
        store: &dyn ProductStore,
        printer: &mut dyn ProductPrinter,
    ) -> Result<(), StoreError> {
        debug!(query = self.name(), "running catalog query");
        match self {
            CatalogQuery::AllProducts => display_all_products(store, printer),
            CatalogQuery::TopMobiles => display_top_mobiles(store, printer),
            CatalogQuery::ByCategoryDesc => display_products_by_category_desc(store, printer),
            CatalogQuery::CountByCategory => display_product_count_by_category(store, printer),
            CatalogQuery::WiredHeadphones => display_wired_headphones(store, printer),
        }
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CatalogQuery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatalogQuery::ALL
            .into_iter()
            .find(|q| q.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = CatalogQuery::ALL.iter().map(|q| q.name()).collect();
                format!("unknown query '{}', expected one of {}", s, names.join(", "))
            })
    }
}

/// Every catalog query, in catalog order. Stops at the first failure.
pub fn run_all(store: &dyn ProductStore, printer: &mut dyn ProductPrinter) -> Result<(), StoreError> {
    for query in CatalogQuery::ALL {
        query.run(store, printer)?;
    }
    Ok(())
}
