use mongodb::bson::{Bson, Document};

use crate::category::{Category, CATEGORY_FIELD};
use crate::conversion::Wrap;
use crate::source::SourceRow;

/// Build the product document for one row: `Category` first, then the
/// category's fields in order. Absent cells are stored as null.
pub fn map_row(category: Category, row: &SourceRow) -> Document {
    let mut doc = Document::new();
    doc.insert(CATEGORY_FIELD, category.label());
    for field in category.fields() {
        let value: Wrap<Bson> = row.get(field).into();
        doc.insert(*field, value.0);
    }
    doc
}

pub fn map_rows<'a, I>(category: Category, rows: I) -> Vec<Document>
where
    I: IntoIterator<Item = &'a SourceRow>,
{
    rows.into_iter().map(|row| map_row(category, row)).collect()
}
