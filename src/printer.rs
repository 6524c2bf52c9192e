//! Output sinks for catalog queries.
//!
//! Printers have no error channel: write failures are logged and dropped.

use std::io::Write;

use mongodb::bson::{Bson, Document};
use tracing::warn;

use crate::buffer::documents_to_frame;
use crate::category::{CATEGORY_FIELD, COMMON_FIELDS, COUNT_FIELD, ID_FIELD};
use crate::conversion::{bson_count, bson_text};

pub trait ProductPrinter {
    fn heading(&mut self, title: &str);

    fn print_all_attributes(&mut self, doc: &Document);

    fn print_common_attributes(&mut self, doc: &Document);

    /// `doc` is a `{_id: <category>, Count: <n>}` group record.
    fn print_category_count(&mut self, doc: &Document);

    /// Called once after the last record of a query.
    fn finish(&mut self) {}
}

fn display(value: Option<&Bson>) -> String {
    value
        .and_then(bson_text)
        .unwrap_or_else(|| "null".to_string())
}

fn common_attributes(doc: &Document) -> Document {
    COMMON_FIELDS
        .iter()
        .map(|f| (f.to_string(), doc.get(f).cloned().unwrap_or(Bson::Null)))
        .collect()
}

fn category_count(doc: &Document) -> Document {
    let category = doc.get(ID_FIELD).cloned().unwrap_or(Bson::Null);
    let count = doc.get(COUNT_FIELD).and_then(bson_count).unwrap_or(0);
    let mut out = Document::new();
    out.insert(CATEGORY_FIELD, category);
    out.insert(COUNT_FIELD, count);
    out
}

/// Line per record, `Field: value` pairs.
pub struct ConsolePrinter<W: Write> {
    out: W,
}

impl ConsolePrinter<std::io::Stdout> {
    pub fn stdout() -> Self {
        ConsolePrinter::new(std::io::stdout())
    }
}

impl<W: Write> ConsolePrinter<W> {
    pub fn new(out: W) -> Self {
        ConsolePrinter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            warn!(error = %e, "failed to write output");
        }
    }

    fn pairs(doc: &Document) -> String {
        doc.iter()
            .map(|(k, v)| format!("{}: {}", k, display(Some(v))))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<W: Write> ProductPrinter for ConsolePrinter<W> {
    fn heading(&mut self, title: &str) {
        self.line(&format!("------ {} ------", title));
    }

    fn print_all_attributes(&mut self, doc: &Document) {
        let line = Self::pairs(doc);
        self.line(&line);
    }

    fn print_common_attributes(&mut self, doc: &Document) {
        let line = Self::pairs(&common_attributes(doc));
        self.line(&line);
    }

    fn print_category_count(&mut self, doc: &Document) {
        let summary = category_count(doc);
        let line = format!(
            "{}: {}",
            display(summary.get(CATEGORY_FIELD)),
            display(summary.get(COUNT_FIELD))
        );
        self.line(&line);
    }

    fn finish(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!(error = %e, "failed to flush output");
        }
    }
}

/// Buffers one query's records and renders them as a polars table.
pub struct TablePrinter<W: Write> {
    out: W,
    rows: Vec<Document>,
}

impl TablePrinter<std::io::Stdout> {
    pub fn stdout() -> Self {
        TablePrinter::new(std::io::stdout())
    }
}

impl<W: Write> TablePrinter<W> {
    pub fn new(out: W) -> Self {
        TablePrinter {
            out,
            rows: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProductPrinter for TablePrinter<W> {
    fn heading(&mut self, title: &str) {
        self.rows.clear();
        if let Err(e) = writeln!(self.out, "{}", title) {
            warn!(error = %e, "failed to write output");
        }
    }

    fn print_all_attributes(&mut self, doc: &Document) {
        self.rows.push(doc.clone());
    }

    fn print_common_attributes(&mut self, doc: &Document) {
        self.rows.push(common_attributes(doc));
    }

    fn print_category_count(&mut self, doc: &Document) {
        self.rows.push(category_count(doc));
    }

    fn finish(&mut self) {
        let rows = std::mem::take(&mut self.rows);
        let written = match documents_to_frame(&rows) {
            Ok(df) => writeln!(self.out, "{}", df),
            Err(e) => {
                warn!(error = %e, "unable to build result table");
                return;
            }
        };
        if let Err(e) = written.and_then(|_| self.out.flush()) {
            warn!(error = %e, "failed to write output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn rendered(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn console_formats_each_sink() {
        let mut p = ConsolePrinter::new(Vec::new());
        p.heading("Displaying All Products");
        p.print_common_attributes(&doc! {
            "_id": "x", "Category": "Mobiles", "ProductId": "M1", "Title": "Phone", "OS": "Android"
        });
        p.print_all_attributes(&doc! { "Category": "Cameras", "Zoom": Bson::Null });
        p.print_category_count(&doc! { "_id": "Headphones", "Count": 2 });
        p.finish();

        let text = rendered(p.into_inner());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "------ Displaying All Products ------",
                "Category: Mobiles, ProductId: M1, Title: Phone, Manufacturer: null",
                "Category: Cameras, Zoom: null",
                "Headphones: 2",
            ]
        );
    }

    #[test]
    fn table_renders_on_finish() {
        let mut p = TablePrinter::new(Vec::new());
        p.heading("Displaying Product Count by categories");
        p.print_category_count(&doc! { "_id": "Mobiles", "Count": 2 });
        p.print_category_count(&doc! { "_id": "Cameras", "Count": 1 });
        p.finish();

        let text = rendered(p.into_inner());
        assert!(text.starts_with("Displaying Product Count by categories"));
        assert!(text.contains("Mobiles"));
        assert!(text.contains("Cameras"));
        assert!(text.contains("Count"));
    }
}
