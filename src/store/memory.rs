use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{CrudError, CrudResult};
use crate::model::{generate_id, matches_query, Document, Lookup, ModelSchema, Query};
use crate::store::traits::{Entity, UrlSlug};

/// Entity adapter keeping documents in process memory, in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryEntity {
    schema: ModelSchema,
    id_field: String,
    documents: Arc<RwLock<Vec<Document>>>,
    slug: Option<UrlSlug>,
}

impl MemoryEntity {
    pub fn new(schema: ModelSchema) -> Self {
        Self {
            schema,
            id_field: "id".to_string(),
            documents: Arc::new(RwLock::new(Vec::new())),
            slug: None,
        }
    }

    pub fn with_id_field(mut self, id_field: &str) -> Self {
        self.id_field = id_field.to_string();
        self
    }

    /// Fill `url_field` from a slug of `source_field` on create.
    pub fn with_url_slug(mut self, url_field: &str, source_field: &str) -> Self {
        self.slug = Some(UrlSlug {
            url_field: url_field.to_string(),
            source_field: source_field.to_string(),
        });
        self
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    fn position(&self, documents: &[Document], lookup: &Lookup) -> Option<usize> {
        match lookup {
            Lookup::Id(id) => documents
                .iter()
                .position(|doc| doc.get(&self.id_field).and_then(Value::as_str) == Some(id.as_str())),
            Lookup::Query(query) => documents.iter().position(|doc| matches_query(doc, query)),
        }
    }

    fn filtered<'a>(
        documents: &'a [Document],
        query: &'a Option<Query>,
    ) -> impl Iterator<Item = &'a Document> + 'a {
        documents
            .iter()
            .filter(move |doc| query.as_ref().map_or(true, |q| matches_query(doc, q)))
    }
}

#[async_trait::async_trait]
impl Entity for MemoryEntity {
    fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    async fn create(&self, mut item: Document) -> CrudResult<Document> {
        for field in self.schema.required_fields() {
            if !item.contains_key(&field.path) {
                return Err(CrudError::Persistence(anyhow::anyhow!(
                    "Path '{}' is required",
                    field.path
                )));
            }
        }
        if let Some(slug) = &self.slug {
            slug.apply(&mut item);
        }
        item.insert(self.id_field.clone(), Value::String(generate_id()));

        self.documents.write().await.push(item.clone());
        Ok(item)
    }

    async fn read_one(&self, lookup: Lookup) -> CrudResult<Document> {
        let documents = self.documents.read().await;
        self.position(&documents, &lookup)
            .map(|index| documents[index].clone())
            .ok_or(CrudError::NotFound)
    }

    async fn read(&self, query: Option<Query>) -> CrudResult<Vec<Document>> {
        let documents = self.documents.read().await;
        Ok(Self::filtered(&documents, &query).cloned().collect())
    }

    async fn read_limit(
        &self,
        query: Option<Query>,
        skip: u64,
        limit: u64,
    ) -> CrudResult<Vec<Document>> {
        let documents = self.documents.read().await;
        Ok(Self::filtered(&documents, &query)
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, query: Option<Query>) -> CrudResult<u64> {
        let documents = self.documents.read().await;
        Ok(Self::filtered(&documents, &query).count() as u64)
    }

    async fn update(&self, lookup: Lookup, item: Document) -> CrudResult<Document> {
        let mut documents = self.documents.write().await;
        let index = self
            .position(&documents, &lookup)
            .ok_or(CrudError::NotFound)?;

        let doc = &mut documents[index];
        for (key, value) in item {
            doc.insert(key, value);
        }
        Ok(doc.clone())
    }
}
