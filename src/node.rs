//! Node bindings, built with `--features node`.

use napi::{Error, Result};
use napi_derive::napi;

use crate::catalog::count_by_category_pipeline;
use crate::category::{COUNT_FIELD, ID_FIELD};
use crate::conversion::{bson_count, bson_text};
use crate::loader::{import_products as run_import, ImportMode};
use crate::source::{MySqlSource, DEFAULT_SCHEMA};
use crate::store::{MongoStore, ProductStore};

fn to_napi<E: std::fmt::Display>(e: E) -> Error {
    Error::from_reason(e.to_string())
}

#[napi(object)]
pub struct ImportSummary {
    pub mobiles: u32,
    pub headphones: u32,
    pub cameras: u32,
    pub inserted: u32,
}

#[napi(object)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[napi]
pub fn import_products(
    sql_url: String,
    mongo_uri: String,
    database: String,
    collection: String,
) -> Result<ImportSummary> {
    let mut source = MySqlSource::connect(&sql_url, DEFAULT_SCHEMA).map_err(to_napi)?;
    let store = MongoStore::connect(&mongo_uri, &database, &collection).map_err(to_napi)?;
    let report = run_import(&mut source, &store, ImportMode::FailFast).map_err(to_napi)?;
    Ok(ImportSummary {
        mobiles: report.mobiles as u32,
        headphones: report.headphones as u32,
        cameras: report.cameras as u32,
        inserted: report.inserted as u32,
    })
}

#[napi]
pub fn product_count_by_category(
    mongo_uri: String,
    database: String,
    collection: String,
) -> Result<Vec<CategoryCount>> {
    let store = MongoStore::connect(&mongo_uri, &database, &collection).map_err(to_napi)?;
    let groups = store
        .aggregate(count_by_category_pipeline())
        .map_err(to_napi)?;
    Ok(groups
        .iter()
        .map(|g| CategoryCount {
            category: g.get(ID_FIELD).and_then(bson_text).unwrap_or_default(),
            count: g.get(COUNT_FIELD).and_then(bson_count).unwrap_or(0),
        })
        .collect())
}
