use crate::conversion::*;
use mongodb::bson::{Bson, Document};
use polars::prelude::*;

/// Column names across `docs`, in first-seen order.
pub(crate) fn collect_columns(docs: &[Document]) -> Vec<String> {
    let mut columns: PlIndexMap<String, ()> = PlIndexMap::default();
    for doc in docs {
        for key in doc.keys() {
            if !columns.contains_key(key) {
                columns.insert(key.clone(), ());
            }
        }
    }
    columns.into_keys().collect()
}

pub(crate) fn init_buffers(
    docs: &[Document],
    columns: &[String],
) -> PlIndexMap<String, Buffer> {
    let capacity = docs.len();
    columns
        .iter()
        .map(|name| {
            let integral = docs
                .iter()
                .filter_map(|d| d.get(name))
                .filter(|v| !matches!(v, Bson::Null))
                .all(|v| matches!(v, Bson::Int32(_) | Bson::Int64(_)));
            let any_value = docs.iter().any(|d| d.get(name).is_some_and(|v| *v != Bson::Null));
            let builder = if integral && any_value {
                Buffer::Int64(PrimitiveChunkedBuilder::new(name, capacity))
            } else {
                Buffer::Utf8(Utf8ChunkedBuilder::new(name, capacity, capacity * 16))
            };
            (name.clone(), builder)
        })
        .collect()
}

pub(crate) enum Buffer {
    Int64(PrimitiveChunkedBuilder<Int64Type>),
    Utf8(Utf8ChunkedBuilder),
}

impl Buffer {
    pub(crate) fn into_series(self) -> Series {
        match self {
            Buffer::Int64(v) => v.finish().into_series(),
            Buffer::Utf8(v) => v.finish().into_series(),
        }
    }

    pub(crate) fn add_null(&mut self) {
        match self {
            Buffer::Int64(v) => v.append_null(),
            Buffer::Utf8(v) => v.append_null(),
        };
    }

    pub(crate) fn add(&mut self, value: &Bson) {
        match self {
            Buffer::Int64(buf) => match bson_count(value) {
                Some(v) => buf.append_value(v),
                None => buf.append_null(),
            },
            Buffer::Utf8(buf) => match bson_text(value) {
                Some(v) => buf.append_value(v),
                None => buf.append_null(),
            },
        }
    }
}

/// One row per document, one column per field. Missing fields are null.
pub fn documents_to_frame(docs: &[Document]) -> PolarsResult<DataFrame> {
    let columns = collect_columns(docs);
    let mut buffers = init_buffers(docs, &columns);
    for doc in docs {
        buffers.iter_mut().for_each(|(s, inner)| match doc.get(s) {
            Some(v) => inner.add(v),
            None => inner.add_null(),
        });
    }
    DataFrame::new(
        buffers
            .into_values()
            .map(|buf| buf.into_series())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn columns_in_first_seen_order() {
        let docs = vec![
            doc! { "Category": "Mobiles", "Title": "a" },
            doc! { "Category": "Cameras", "Zoom": "10x", "Title": "b" },
        ];
        assert_eq!(collect_columns(&docs), ["Category", "Title", "Zoom"]);
    }

    #[test]
    fn frame_has_nulls_for_missing_fields() {
        let docs = vec![
            doc! { "Category": "Mobiles", "Title": "a" },
            doc! { "Category": "Cameras", "Zoom": "10x" },
        ];
        let df = documents_to_frame(&docs).unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("Title").unwrap().null_count(), 1);
        assert_eq!(df.column("Zoom").unwrap().null_count(), 1);
    }

    #[test]
    fn integer_columns_stay_numeric() {
        let docs = vec![
            doc! { "_id": "Mobiles", "Count": 2 },
            doc! { "_id": "Headphones", "Count": 3_i64 },
        ];
        let df = documents_to_frame(&docs).unwrap();
        assert_eq!(df.column("Count").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("_id").unwrap().dtype(), &DataType::Utf8);
    }
}
