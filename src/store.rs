//! Document stores the loader writes to and the catalog reads from.
//!
//! [`MongoStore`] wraps a sync `mongodb` collection. [`MemoryStore`] keeps
//! documents in a `Vec` and evaluates the subset of the query language the
//! catalog uses: equality and `$and` filters, sort, projection, limit, and the
//! `$match`/`$group`/`$sort`/`$limit` aggregation stages.

use std::cmp::Ordering;

use mongodb::{
    bson::{oid::ObjectId, Bson, Document},
    options::{ClientOptions, FindOptions},
    sync::{Client, Collection, Cursor},
};
use tracing::debug;

use crate::category::ID_FIELD;
use crate::conversion::{bson_count, bson_text};
use crate::error::StoreError;

/// Options of a `find`, mirroring the driver's sort/projection/limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub limit: Option<i64>,
}

impl FindSpec {
    pub fn with_sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }
    pub fn with_projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

pub trait ProductStore {
    /// Insert all documents in one call, returning how many were written.
    fn insert_many(&self, docs: Vec<Document>) -> Result<usize, StoreError>;

    fn find(&self, filter: Option<Document>, spec: FindSpec) -> Result<Vec<Document>, StoreError>;

    fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError>;

    fn count(&self, filter: Option<Document>) -> Result<u64, StoreError>;
}

pub struct MongoStore {
    pub collection: Collection<Document>,
}

impl MongoStore {
    pub fn new(collection: Collection<Document>) -> Self {
        MongoStore { collection }
    }

    pub fn connect(connection_str: &str, db: &str, collection: &str) -> Result<Self, StoreError> {
        let client_options = ClientOptions::parse(connection_str)
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        let client =
            Client::with_options(client_options).map_err(|e| StoreError::Connect(e.to_string()))?;

        let database = client.database(db);
        Ok(MongoStore::new(database.collection::<Document>(collection)))
    }

    // the cursor is dropped on every path, including a failed `next`
    fn drain(cursor: Cursor<Document>) -> Result<Vec<Document>, StoreError> {
        cursor
            .collect::<mongodb::error::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }
}

impl ProductStore for MongoStore {
    fn insert_many(&self, docs: Vec<Document>) -> Result<usize, StoreError> {
        let res = self.collection.insert_many(docs, None)?;
        Ok(res.inserted_ids.len())
    }

    fn find(&self, filter: Option<Document>, spec: FindSpec) -> Result<Vec<Document>, StoreError> {
        let mut find_options = FindOptions::default();
        find_options.sort = spec.sort;
        find_options.projection = spec.projection;
        find_options.limit = spec.limit;

        debug!(?filter, ?find_options, "mongo find");
        let cursor = self.collection.find(filter, Some(find_options))?;
        Self::drain(cursor)
    }

    fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        debug!(?pipeline, "mongo aggregate");
        let cursor = self.collection.aggregate(pipeline, None)?;
        Self::drain(cursor)
    }

    fn count(&self, filter: Option<Document>) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(filter, None)?)
    }
}

/// In-process collection for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: std::sync::Mutex<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored documents, in insertion order.
    pub fn snapshot(&self) -> Vec<Document> {
        match self.docs.lock() {
            Ok(docs) => docs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProductStore for MemoryStore {
    fn insert_many(&self, docs: Vec<Document>) -> Result<usize, StoreError> {
        if docs.is_empty() {
            return Err(StoreError::unsupported("insert", "empty batch"));
        }
        let mut stored = self.docs.lock().unwrap_or_else(|p| p.into_inner());
        let n = docs.len();
        for mut doc in docs {
            if !doc.contains_key(ID_FIELD) {
                // the server puts a generated _id first
                let mut with_id = Document::new();
                with_id.insert(ID_FIELD, ObjectId::new());
                with_id.extend(doc);
                doc = with_id;
            }
            stored.push(doc);
        }
        Ok(n)
    }

    fn find(&self, filter: Option<Document>, spec: FindSpec) -> Result<Vec<Document>, StoreError> {
        let mut docs = filter_docs(self.snapshot(), filter.as_ref())?;
        if let Some(sort) = &spec.sort {
            sort_docs(&mut docs, sort)?;
        }
        // a zero limit means no limit, negative limits are a single batch of |n|
        if let Some(limit) = spec.limit.filter(|l| *l != 0) {
            docs.truncate(limit.unsigned_abs() as usize);
        }
        match &spec.projection {
            Some(projection) => docs
                .into_iter()
                .map(|d| project(d, projection))
                .collect(),
            None => Ok(docs),
        }
    }

    fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        let mut docs = self.snapshot();
        for stage in &pipeline {
            let (op, arg) = match stage.iter().next() {
                Some(entry) if stage.len() == 1 => entry,
                _ => return Err(StoreError::unsupported("stage", stage.to_string())),
            };
            docs = match (op.as_str(), arg) {
                ("$match", Bson::Document(filter)) => filter_docs(docs, Some(filter))?,
                ("$group", Bson::Document(spec)) => group(docs, spec)?,
                ("$sort", Bson::Document(spec)) => {
                    sort_docs(&mut docs, spec)?;
                    docs
                }
                ("$limit", limit) => {
                    let n = bson_count(limit)
                        .filter(|n| *n > 0)
                        .ok_or_else(|| StoreError::unsupported("$limit", limit.to_string()))?;
                    docs.truncate(n as usize);
                    docs
                }
                _ => return Err(StoreError::unsupported("stage", stage.to_string())),
            };
        }
        Ok(docs)
    }

    fn count(&self, filter: Option<Document>) -> Result<u64, StoreError> {
        Ok(filter_docs(self.snapshot(), filter.as_ref())?.len() as u64)
    }
}

fn filter_docs(docs: Vec<Document>, filter: Option<&Document>) -> Result<Vec<Document>, StoreError> {
    let filter = match filter {
        Some(f) if !f.is_empty() => f,
        _ => return Ok(docs),
    };
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        if matches(&doc, filter)? {
            out.push(doc);
        }
    }
    Ok(out)
}

fn matches(doc: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (key, expected) in filter {
        let ok = match (key.as_str(), expected) {
            ("$and", Bson::Array(clauses)) => {
                let mut all = true;
                for clause in clauses {
                    match clause {
                        Bson::Document(c) => all &= matches(doc, c)?,
                        other => return Err(StoreError::unsupported("$and clause", other.to_string())),
                    }
                }
                all
            }
            (op, _) if op.starts_with('$') => {
                return Err(StoreError::unsupported("operator", op.to_string()))
            }
            (_, Bson::Document(d)) if d.keys().any(|k| k.starts_with('$')) => {
                return Err(StoreError::unsupported("operator", d.to_string()))
            }
            (field, expected) => match doc.get(field) {
                Some(actual) => actual == expected,
                None => *expected == Bson::Null,
            },
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sort_docs(docs: &mut [Document], sort: &Document) -> Result<(), StoreError> {
    let mut keys = Vec::with_capacity(sort.len());
    for (field, direction) in sort {
        let descending = match bson_count(direction) {
            Some(1) => false,
            Some(-1) => true,
            _ => return Err(StoreError::unsupported("sort direction", direction.to_string())),
        };
        keys.push((field.as_str(), descending));
    }
    docs.sort_by(|a, b| {
        keys.iter()
            .map(|(field, descending)| {
                let ord = compare_values(a.get(field), b.get(field));
                if *descending {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    Ok(())
}

// missing and null sort before any value, otherwise compare as text
fn compare_values(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let a = a.and_then(bson_text);
    let b = b.and_then(bson_text);
    a.cmp(&b)
}

fn project(doc: Document, projection: &Document) -> Result<Document, StoreError> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for (field, flag) in projection {
        match bson_count(flag).or(match flag {
            Bson::Boolean(b) => Some(*b as i64),
            _ => None,
        }) {
            Some(0) => exclude.push(field.as_str()),
            Some(_) => include.push(field.as_str()),
            None => return Err(StoreError::unsupported("projection", flag.to_string())),
        }
    }
    if include.is_empty() {
        return Ok(doc
            .into_iter()
            .filter(|(k, _)| !exclude.contains(&k.as_str()))
            .collect());
    }
    if exclude.iter().any(|f| *f != ID_FIELD) {
        return Err(StoreError::unsupported(
            "projection",
            "mixed inclusion and exclusion",
        ));
    }
    let keep_id = !exclude.contains(&ID_FIELD);
    Ok(doc
        .into_iter()
        .filter(|(k, _)| include.contains(&k.as_str()) || (keep_id && k == ID_FIELD))
        .collect())
}

fn group(docs: Vec<Document>, spec: &Document) -> Result<Vec<Document>, StoreError> {
    let key_field = match spec.get(ID_FIELD) {
        Some(Bson::String(path)) if path.starts_with('$') => &path[1..],
        other => {
            return Err(StoreError::unsupported(
                "$group key",
                format!("{:?}", other),
            ))
        }
    };

    let mut accumulators = Vec::new();
    for (name, acc) in spec.iter().filter(|(k, _)| k.as_str() != ID_FIELD) {
        let amount = match acc {
            Bson::Document(d) if d.len() == 1 => d
                .get("$sum")
                .and_then(bson_count)
                .ok_or_else(|| StoreError::unsupported("accumulator", d.to_string()))?,
            other => return Err(StoreError::unsupported("accumulator", other.to_string())),
        };
        accumulators.push((name.as_str(), amount));
    }

    // groups come out in first-seen order
    let mut groups: Vec<(Bson, Vec<i64>)> = Vec::new();
    for doc in &docs {
        let key = doc.get(key_field).cloned().unwrap_or(Bson::Null);
        let idx = match groups.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                groups.push((key, vec![0; accumulators.len()]));
                groups.len() - 1
            }
        };
        for (total, (_, amount)) in groups[idx].1.iter_mut().zip(&accumulators) {
            *total += amount;
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, totals)| {
            let mut out = Document::new();
            out.insert(ID_FIELD, key);
            for ((name, _), total) in accumulators.iter().zip(totals) {
                match i32::try_from(total) {
                    Ok(v) => out.insert(*name, v),
                    Err(_) => out.insert(*name, total),
                };
            }
            out
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_many(vec![
                doc! { "Category": "Mobiles", "Title": "a" },
                doc! { "Category": "Headphones", "Title": "b", "ConnectorType": "Wired" },
                doc! { "Category": "Cameras", "Title": "c" },
                doc! { "Category": "Headphones", "Title": "d", "ConnectorType": "Wireless" },
                doc! { "Category": "Mobiles", "Title": "e" },
            ])
            .unwrap();
        store
    }

    fn titles(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.get_str("Title").unwrap()).collect()
    }

    #[test]
    fn insert_assigns_ids() {
        let store = seeded();
        let docs = store.snapshot();
        assert_eq!(docs.len(), 5);
        for d in &docs {
            assert_eq!(d.keys().next().map(String::as_str), Some(ID_FIELD));
            assert!(d.get_object_id(ID_FIELD).is_ok());
        }
        assert!(store.insert_many(vec![]).is_err());
    }

    #[test]
    fn equality_and_conjunction() {
        let store = seeded();
        let mobiles = store
            .find(Some(doc! { "Category": "Mobiles" }), FindSpec::default())
            .unwrap();
        assert_eq!(titles(&mobiles), ["a", "e"]);

        let wired = store
            .find(
                Some(doc! { "$and": [ { "Category": "Headphones" }, { "ConnectorType": "Wired" } ] }),
                FindSpec::default(),
            )
            .unwrap();
        assert_eq!(titles(&wired), ["b"]);
        assert_eq!(store.count(Some(doc! { "ConnectorType": "Wired" })).unwrap(), 1);
    }

    #[test]
    fn unknown_operators_are_rejected() {
        let store = seeded();
        assert!(store
            .find(Some(doc! { "Title": { "$gt": "a" } }), FindSpec::default())
            .is_err());
        assert!(store
            .find(Some(doc! { "$or": [ { "Title": "a" } ] }), FindSpec::default())
            .is_err());
    }

    #[test]
    fn sort_limit_and_projection() {
        let store = seeded();
        let spec = FindSpec::default()
            .with_sort(doc! { "Category": -1, "Title": 1 })
            .with_projection(doc! { "_id": 0 })
            .with_limit(4);
        let docs = store.find(None, spec).unwrap();
        assert_eq!(titles(&docs), ["a", "e", "b", "d"]);
        assert!(docs.iter().all(|d| !d.contains_key(ID_FIELD)));

        let only_title = store
            .find(None, FindSpec::default().with_projection(doc! { "Title": 1, "_id": 0 }))
            .unwrap();
        assert!(only_title.iter().all(|d| d.len() == 1));
    }

    #[test]
    fn group_counts_per_key() {
        let store = seeded();
        let groups = store
            .aggregate(vec![doc! { "$group": { "_id": "$Category", "Count": { "$sum": 1 } } }])
            .unwrap();
        let counts: Vec<(&str, i32)> = groups
            .iter()
            .map(|g| (g.get_str("_id").unwrap(), g.get_i32("Count").unwrap()))
            .collect();
        assert_eq!(counts, [("Mobiles", 2), ("Headphones", 2), ("Cameras", 1)]);
    }

    #[test]
    fn pipeline_stages_compose() {
        let store = seeded();
        let out = store
            .aggregate(vec![
                doc! { "$match": { "Category": "Headphones" } },
                doc! { "$sort": { "Title": -1 } },
                doc! { "$limit": 1 },
            ])
            .unwrap();
        assert_eq!(titles(&out), ["d"]);
        assert!(store.aggregate(vec![doc! { "$unwind": "$Title" }]).is_err());
    }
}
