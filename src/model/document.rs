use serde_json::{Map, Value};
use uuid::Uuid;

/// A stored record as the storage layer sees it.
pub type Document = Map<String, Value>;

/// A field-equality filter. Every key must match for a document to be selected.
pub type Query = Map<String, Value>;

/// How to locate a single document.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Identity lookup against the adapter's id.
    Id(String),
    /// Filtered lookup, first match wins.
    Query(Query),
}

impl From<&str> for Lookup {
    fn from(id: &str) -> Self {
        Lookup::Id(id.to_string())
    }
}

impl From<String> for Lookup {
    fn from(id: String) -> Self {
        Lookup::Id(id)
    }
}

impl From<Query> for Lookup {
    fn from(query: Query) -> Self {
        Lookup::Query(query)
    }
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Build a single-field query.
pub fn query_for(field: &str, value: impl Into<Value>) -> Query {
    let mut query = Query::new();
    query.insert(field.to_string(), value.into());
    query
}

/// Resolve a dotted path (`author.name`) inside a document.
pub fn value_at<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Non-empty string value of a top-level field.
pub fn string_field<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// True when every query key matches the document value exactly.
pub fn matches_query(doc: &Document, query: &Query) -> bool {
    query
        .iter()
        .all(|(key, expected)| value_at(doc, key) == Some(expected))
}

/// Lowercase, dash-separated url segment derived from free text.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
