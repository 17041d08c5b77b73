use bson::{Bson, Document};

/// Resolve a dotted path (`location.state`) inside a document.
pub(crate) fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Copy `value` into `out` at a dotted path, creating intermediate documents.
fn set_path(out: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            out.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(out.get(head), Some(Bson::Document(_))) {
                out.insert(head, Document::new());
            }
            if let Some(Bson::Document(inner)) = out.get_mut(head) {
                set_path(inner, rest, value);
            }
        }
    }
}

/// Keep only `_id` and the listed (possibly dotted) fields.
pub(crate) fn project(doc: &Document, columns: &[String]) -> Document {
    let mut out = Document::new();
    if let Some(id) = doc.get("_id") {
        out.insert("_id", id.clone());
    }
    for column in columns {
        if let Some(value) = get_path(doc, column) {
            set_path(&mut out, column, value.clone());
        }
    }
    out
}
