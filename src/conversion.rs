use mongodb::bson::Bson;

#[derive(Debug)]
#[repr(transparent)]
pub struct Wrap<T>(pub T);

impl<T> Clone for Wrap<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Wrap(self.0.clone())
    }
}
impl<T> From<T> for Wrap<T> {
    fn from(t: T) -> Self {
        Wrap(t)
    }
}

/// A relational cell carried over as text, `NULL` stays null.
impl From<Option<&str>> for Wrap<Bson> {
    fn from(cell: Option<&str>) -> Self {
        match cell {
            Some(v) => Wrap(Bson::String(v.to_string())),
            None => Wrap(Bson::Null),
        }
    }
}

/// Display text for a stored value. `None` for null-ish values.
impl From<&Bson> for Wrap<Option<String>> {
    fn from(bson: &Bson) -> Self {
        let text = match bson {
            Bson::String(v) => Some(v.clone()),
            Bson::Symbol(s) => Some(s.clone()),
            Bson::JavaScriptCode(v) => Some(v.clone()),
            Bson::RegularExpression(r) => Some(r.to_string()),
            Bson::ObjectId(oid) => Some(oid.to_hex()),
            Bson::Int32(v) => Some(v.to_string()),
            Bson::Int64(v) => Some(v.to_string()),
            Bson::Double(v) => Some(v.to_string()),
            Bson::Boolean(b) => Some(b.to_string()),
            Bson::DateTime(dt) => Some(dt.to_string()),
            Bson::Document(doc) => Some(doc.to_string()),
            Bson::Array(arr) => Some(format!("{:?}", arr)),
            Bson::Null | Bson::Undefined => None,
            v => Some(format!("{:?}", v)),
        };
        Wrap(text)
    }
}

pub(crate) fn bson_text(value: &Bson) -> Option<String> {
    let text: Wrap<Option<String>> = value.into();
    text.0
}

/// Integer value of a numeric bson, used for aggregate counts.
pub(crate) fn bson_count(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(*v as i64),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn cells_become_strings_or_null() {
        let s: Wrap<Bson> = Some("Wired").into();
        assert_eq!(s.0, Bson::String("Wired".into()));
        let n: Wrap<Bson> = None.into();
        assert_eq!(n.0, Bson::Null);
        let empty: Wrap<Bson> = Some("").into();
        assert_eq!(empty.0, Bson::String(String::new()));
    }

    #[test]
    fn text_for_stored_values() {
        assert_eq!(bson_text(&Bson::String("a".into())).as_deref(), Some("a"));
        assert_eq!(bson_text(&Bson::Int32(7)).as_deref(), Some("7"));
        assert_eq!(bson_text(&Bson::Null), None);
        let oid = ObjectId::new();
        assert_eq!(bson_text(&Bson::ObjectId(oid)), Some(oid.to_hex()));
    }

    #[test]
    fn counts_from_numbers_only() {
        assert_eq!(bson_count(&Bson::Int32(3)), Some(3));
        assert_eq!(bson_count(&Bson::Int64(4)), Some(4));
        assert_eq!(bson_count(&Bson::Double(2.0)), Some(2));
        assert_eq!(bson_count(&Bson::String("2".into())), None);
    }
}
