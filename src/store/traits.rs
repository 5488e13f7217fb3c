use crate::error::{CrudError, CrudResult};
use crate::model::{Document, Lookup, ModelSchema, Query};

/// Storage-agnostic access to one kind of record.
///
/// The controller only ever talks to storage through this trait. Every
/// operation has a default body that fails with `CrudError::NotImplemented`,
/// so an adapter that forgets a method fails on first use instead of
/// silently doing nothing.
#[async_trait::async_trait]
pub trait Entity: Send + Sync {
    /// The field paths of the underlying model.
    fn schema(&self) -> &ModelSchema;

    /// Persist a new record and return it as stored.
    async fn create(&self, _item: Document) -> CrudResult<Document> {
        Err(CrudError::NotImplemented("create"))
    }

    /// Fetch exactly one record by id or by query.
    async fn read_one(&self, _lookup: Lookup) -> CrudResult<Document> {
        Err(CrudError::NotImplemented("read_one"))
    }

    /// Every matching record. Unbounded, callers limit responsibly.
    async fn read(&self, _query: Option<Query>) -> CrudResult<Vec<Document>> {
        Err(CrudError::NotImplemented("read"))
    }

    /// One page of matching records in storage order.
    async fn read_limit(
        &self,
        _query: Option<Query>,
        _skip: u64,
        _limit: u64,
    ) -> CrudResult<Vec<Document>> {
        Err(CrudError::NotImplemented("read_limit"))
    }

    /// Number of matching records, `None` counts all.
    async fn count(&self, _query: Option<Query>) -> CrudResult<u64> {
        Err(CrudError::NotImplemented("count"))
    }

    /// Assign every key of `item` onto the target record and persist it.
    async fn update(&self, _lookup: Lookup, _item: Document) -> CrudResult<Document> {
        Err(CrudError::NotImplemented("update"))
    }

    async fn delete(&self, _lookup: Lookup) -> CrudResult<bool> {
        Err(CrudError::NotImplemented("delete"))
    }
}

/// Derives the url field from another field when a create body leaves it out.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlSlug {
    pub url_field: String,
    pub source_field: String,
}

impl UrlSlug {
    pub fn apply(&self, item: &mut Document) {
        if crate::model::string_field(item, &self.url_field).is_some() {
            return;
        }
        let slug = crate::model::string_field(item, &self.source_field).map(crate::model::slugify);
        if let Some(slug) = slug.filter(|slug| !slug.is_empty()) {
            item.insert(self.url_field.clone(), serde_json::Value::String(slug));
        }
    }
}
