use anyhow::Context;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row};

use crate::error::{CrudError, CrudResult};
use crate::model::{generate_id, Document, Lookup, ModelSchema, Query};
use crate::store::traits::{Entity, UrlSlug};

/// Document-store Entity adapter: one JSONB row per record in `crude_documents`,
/// partitioned by collection name.
#[derive(Debug, Clone)]
pub struct PostgresEntity {
    pool: PgPool,
    schema: ModelSchema,
    id_field: String,
    slug: Option<UrlSlug>,
}

impl PostgresEntity {
    /// Connect a new pool and back the entity with the schema's collection.
    pub async fn connect(database_url: &str, max_connections: u32, schema: ModelSchema) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self::new(pool, schema))
    }

    pub fn new(pool: PgPool, schema: ModelSchema) -> Self {
        Self {
            pool,
            schema,
            id_field: "id".to_string(),
            slug: None,
        }
    }

    pub fn with_id_field(mut self, id_field: &str) -> Self {
        self.id_field = id_field.to_string();
        self
    }

    pub fn with_url_slug(mut self, url_field: &str, source_field: &str) -> Self {
        self.slug = Some(UrlSlug {
            url_field: url_field.to_string(),
            source_field: source_field.to_string(),
        });
        self
    }

    /// Create the document table if it does not exist yet.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS crude_documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                body JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create crude_documents table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS crude_documents_collection_idx ON crude_documents (collection, created_at)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create crude_documents index")?;

        log::info!("Document table ready for collection '{}'", self.schema.name);
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn collection(&self) -> &str {
        &self.schema.name
    }

    async fn find_row(&self, lookup: &Lookup) -> CrudResult<Option<(String, Document)>> {
        let row = match lookup {
            Lookup::Id(id) => {
                sqlx::query("SELECT id, body FROM crude_documents WHERE collection = $1 AND id = $2")
                    .bind(self.collection())
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
            }
            Lookup::Query(query) => {
                sqlx::query(
                    "SELECT id, body FROM crude_documents WHERE collection = $1 AND body @> $2 ORDER BY created_at LIMIT 1",
                )
                .bind(self.collection())
                .bind(Json(query))
                .fetch_optional(&self.pool)
                .await
            }
        }
        .context("Failed to fetch document")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Json(body): Json<Document> = row.try_get("body").context("Malformed document body")?;
        Ok(Some((row.get("id"), body)))
    }

    fn filter(query: Option<Query>) -> Json<Query> {
        Json(query.unwrap_or_default())
    }
}

fn bodies(rows: Vec<sqlx::postgres::PgRow>) -> CrudResult<Vec<Document>> {
    rows.into_iter()
        .map(|row| -> CrudResult<Document> {
            let Json(body): Json<Document> =
                row.try_get("body").context("Malformed document body")?;
            Ok(body)
        })
        .collect()
}

#[async_trait::async_trait]
impl Entity for PostgresEntity {
    fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    async fn create(&self, mut item: Document) -> CrudResult<Document> {
        for field in self.schema.required_fields() {
            if !item.contains_key(&field.path) {
                return Err(anyhow::anyhow!("Path '{}' is required", field.path).into());
            }
        }
        if let Some(slug) = &self.slug {
            slug.apply(&mut item);
        }

        let id = generate_id();
        item.insert(self.id_field.clone(), Value::String(id.clone()));
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO crude_documents (id, collection, body, created_at, updated_at) VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(&id)
        .bind(self.collection())
        .bind(Json(&item))
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert document")?;

        Ok(item)
    }

    async fn read_one(&self, lookup: Lookup) -> CrudResult<Document> {
        self.find_row(&lookup)
            .await?
            .map(|(_, body)| body)
            .ok_or(CrudError::NotFound)
    }

    async fn read(&self, query: Option<Query>) -> CrudResult<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT body FROM crude_documents WHERE collection = $1 AND body @> $2 ORDER BY created_at",
        )
        .bind(self.collection())
        .bind(Self::filter(query))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list documents")?;

        bodies(rows)
    }

    async fn read_limit(
        &self,
        query: Option<Query>,
        skip: u64,
        limit: u64,
    ) -> CrudResult<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT body FROM crude_documents WHERE collection = $1 AND body @> $2 ORDER BY created_at OFFSET $3 LIMIT $4",
        )
        .bind(self.collection())
        .bind(Self::filter(query))
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list documents")?;

        bodies(rows)
    }

    async fn count(&self, query: Option<Query>) -> CrudResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM crude_documents WHERE collection = $1 AND body @> $2",
        )
        .bind(self.collection())
        .bind(Self::filter(query))
        .fetch_one(&self.pool)
        .await
        .context("Failed to count documents")?;

        Ok(count.max(0) as u64)
    }

    async fn update(&self, lookup: Lookup, item: Document) -> CrudResult<Document> {
        let (id, mut body) = self.find_row(&lookup).await?.ok_or(CrudError::NotFound)?;

        for (key, value) in item {
            body.insert(key, value);
        }

        sqlx::query("UPDATE crude_documents SET body = $1, updated_at = $2 WHERE id = $3")
            .bind(Json(&body))
            .bind(chrono::Utc::now())
            .bind(&id)
            .execute(&self.pool)
            .await
            .context("Failed to save document")?;

        Ok(body)
    }
}
