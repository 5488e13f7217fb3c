pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

pub use api::{create_router, Controller, Crud, Hooks, Pipeline, Step};
pub use error::{CrudError, CrudResult, ErrorResponse};
pub use logic::{process, SchemaView};
pub use model::*;
pub use store::{Entity, MemoryEntity, PostgresEntity};

use std::sync::Arc;

/// The record type served by the bundled server binary.
pub fn article_schema() -> ModelSchema {
    ModelSchema::new("articles")
        .field(FieldDef::new("id", FieldKind::ObjectId))
        .field(FieldDef::new("name", FieldKind::String).required())
        .field(FieldDef::new("localUrl", FieldKind::String))
        .field(FieldDef::new("body", FieldKind::String))
        .field(FieldDef::new("author.name", FieldKind::String))
        .field(FieldDef::new("published", FieldKind::Boolean))
        .field(FieldDef::new("createdAt", FieldKind::Date))
}

/// Builds the article resource on Postgres when a database is configured,
/// in memory otherwise.
pub async fn build_app(config: &config::AppConfig) -> anyhow::Result<axum::Router> {
    let url_field = config.controller.url_field.clone();
    let name_field = config.controller.name_field.clone();

    let entity: Arc<dyn Entity> = match config.database_url() {
        Some(database_url) => {
            log::info!("Connecting to PostgreSQL...");
            let postgres =
                PostgresEntity::connect(&database_url, config.max_connections(), article_schema())
                    .await?
                    .with_url_slug(&url_field, &name_field);
            postgres.migrate().await?;
            Arc::new(postgres)
        }
        None => {
            log::info!("No database configured, keeping records in memory");
            Arc::new(MemoryEntity::new(article_schema()).with_url_slug(&url_field, &name_field))
        }
    };

    Ok(Crud::new(entity, config.controller.clone())?.into_router())
}

// Function for integration testing
pub async fn run_server(config: config::AppConfig) -> anyhow::Result<()> {
    use axum::serve;
    use tokio::net::TcpListener;

    let app = build_app(&config).await?;

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!(
        "Serving {} on http://{}",
        config.controller.base_url,
        bind_address
    );

    serve(listener, app).await?;

    Ok(())
}
