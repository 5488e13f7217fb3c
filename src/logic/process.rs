use crate::model::Document;

/// Drop every key starting with an underscore before the body reaches storage.
///
/// This is not validation, it only keeps client-supplied "private" keys away
/// from field assignment.
pub fn process(params: &Document) -> Document {
    params
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Built-in result sanitizer: drops storage bookkeeping keys such as `__v`.
pub fn sanitize(doc: Document) -> Document {
    doc.into_iter()
        .filter(|(key, _)| !key.starts_with("__"))
        .collect()
}
