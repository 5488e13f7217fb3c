use std::path::PathBuf;
use std::sync::Arc;

use crude::{
    ControllerOptions, Crud, CrudResult, Document, Entity, FieldDef, FieldKind, Lookup,
    MemoryEntity, ModelSchema, Query,
};
use parking_lot::Mutex;
use reqwest::{header, redirect, Client, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Wraps the in-memory store and records every call made through it.
struct CountingEntity {
    inner: MemoryEntity,
    calls: Mutex<Vec<&'static str>>,
}

impl CountingEntity {
    fn new(inner: MemoryEntity) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl Entity for CountingEntity {
    fn schema(&self) -> &ModelSchema {
        self.inner.schema()
    }

    async fn create(&self, item: Document) -> CrudResult<Document> {
        self.record("create");
        self.inner.create(item).await
    }

    async fn read_one(&self, lookup: Lookup) -> CrudResult<Document> {
        self.record("read_one");
        self.inner.read_one(lookup).await
    }

    async fn read(&self, query: Option<Query>) -> CrudResult<Vec<Document>> {
        self.record("read");
        self.inner.read(query).await
    }

    async fn read_limit(&self, query: Option<Query>, skip: u64, limit: u64) -> CrudResult<Vec<Document>> {
        self.record("read_limit");
        self.inner.read_limit(query, skip, limit).await
    }

    async fn count(&self, query: Option<Query>) -> CrudResult<u64> {
        self.record("count");
        self.inner.count(query).await
    }

    async fn update(&self, lookup: Lookup, item: Document) -> CrudResult<Document> {
        self.record("update");
        self.inner.update(lookup, item).await
    }

    async fn delete(&self, _lookup: Lookup) -> CrudResult<bool> {
        self.record("delete");
        Ok(true)
    }
}

fn schema() -> ModelSchema {
    ModelSchema::new("articles")
        .field(FieldDef::new("id", FieldKind::ObjectId))
        .field(FieldDef::new("name", FieldKind::String).required())
        .field(FieldDef::new("localUrl", FieldKind::String))
        .field(FieldDef::new("owner", FieldKind::String))
}

fn slugged() -> Arc<CountingEntity> {
    CountingEntity::new(MemoryEntity::new(schema()).with_url_slug("localUrl", "name"))
}

fn options() -> ControllerOptions {
    let mut opts = ControllerOptions::new("/articles");
    opts.edit_view = Some(PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/edit.html")));
    opts
}

async fn spawn(entity: Arc<CountingEntity>, opts: ControllerOptions) -> String {
    let crud = Crud::new(entity, opts).expect("controller should build");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, crud.into_router()).await.unwrap();
    });
    format!("http://{}", address)
}

fn client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `crude.sid=...` from the response that opened the session.
fn session(response: &Response) -> String {
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn stored_id(entity: &CountingEntity, url: &str) -> String {
    let doc = entity
        .inner
        .read_one(Lookup::Query(crude::query_for("localUrl", url)))
        .await
        .unwrap();
    doc["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_redirects_to_record_and_flashes_success() {
    let base = spawn(slugged(), options()).await;
    let client = client();

    let created = client
        .post(format!("{base}/articles"))
        .form(&[("name", "Hello World")])
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::FOUND);
    assert_eq!(location(&created), "/articles/hello-world");
    let cookie = session(&created);

    let page = client
        .get(format!("{base}/articles/hello-world"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    let html = page.text().await.unwrap();
    assert!(html.contains("Hello World"));
    assert!(html.contains("saved"));

    // flash messages are shown once
    let again = client
        .get(format!("{base}/articles/hello-world"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert!(!again.text().await.unwrap().contains("saved"));
}

#[tokio::test]
async fn test_failed_create_redirects_html_clients_to_add_form() {
    let base = spawn(slugged(), options()).await;
    let client = client();

    let failed = client
        .post(format!("{base}/articles"))
        .form(&[("body", "no name")])
        .send()
        .await
        .unwrap();
    assert_eq!(failed.status(), StatusCode::FOUND);
    assert_eq!(location(&failed), "/articles/add");

    let form = client
        .get(format!("{base}/articles/add"))
        .header(header::COOKIE, session(&failed))
        .send()
        .await
        .unwrap();
    assert!(form.text().await.unwrap().contains("is required"));
}

#[tokio::test]
async fn test_failed_create_answers_json_clients_with_400() {
    let base = spawn(slugged(), options()).await;

    let failed = client()
        .post(format!("{base}/articles"))
        .header(header::ACCEPT, "application/json")
        .json(&json!({"body": "no name"}))
        .send()
        .await
        .unwrap();
    assert_eq!(failed.status(), StatusCode::BAD_REQUEST);
    let error: Value = failed.json().await.unwrap();
    assert_eq!(error["code"], "persistence");
    assert_eq!(error["message"], "Path 'name' is required");
}

#[tokio::test]
async fn test_create_without_url_field_is_a_consistency_error() {
    let entity = CountingEntity::new(MemoryEntity::new(schema()));
    let base = spawn(entity, options()).await;

    let failed = client()
        .post(format!("{base}/articles"))
        .header(header::ACCEPT, "application/json")
        .json(&json!({"name": "No slug"}))
        .send()
        .await
        .unwrap();
    assert_eq!(failed.status(), StatusCode::BAD_REQUEST);
    let error: Value = failed.json().await.unwrap();
    assert_eq!(error["code"], "consistency");
    assert_eq!(error["message"], "An error occured, please try again. #201");
}

#[tokio::test]
async fn test_update_redirects_when_url_changes_and_renders_otherwise() {
    let entity = slugged();
    let base = spawn(entity.clone(), options()).await;
    let client = client();

    client
        .post(format!("{base}/articles"))
        .form(&[("name", "Intro")])
        .send()
        .await
        .unwrap();
    let id = stored_id(&entity, "intro").await;

    let moved = client
        .put(format!("{base}/articles/intro"))
        .form(&[("id", id.as_str()), ("localUrl", "welcome"), ("_csrf", "dropped")])
        .send()
        .await
        .unwrap();
    assert_eq!(moved.status(), StatusCode::FOUND);
    assert_eq!(location(&moved), "/articles/welcome");

    let stored = entity.inner.read_one(Lookup::Id(id.clone())).await.unwrap();
    assert!(stored.get("_csrf").is_none());

    let stayed = client
        .post(format!("{base}/articles/welcome"))
        .form(&[("id", id.as_str()), ("name", "Welcome")])
        .send()
        .await
        .unwrap();
    assert_eq!(stayed.status(), StatusCode::OK);
    let html = stayed.text().await.unwrap();
    assert!(html.contains("Welcome"));
    assert!(html.contains("saved"));
}

#[tokio::test]
async fn test_edit_form_is_prefilled_and_shows_pending_error() {
    let entity = slugged();
    let base = spawn(entity.clone(), options()).await;
    let client = client();

    client
        .post(format!("{base}/articles"))
        .form(&[("name", "Intro")])
        .send()
        .await
        .unwrap();
    let id = stored_id(&entity, "intro").await;

    let form = client
        .get(format!("{base}/articles/intro/edit"))
        .send()
        .await
        .unwrap();
    assert_eq!(form.status(), StatusCode::OK);
    let html = form.text().await.unwrap();
    assert!(html.contains(&format!("value=\"{id}\"")));
    assert!(html.contains("value=\"Intro\""));

    let missing = client
        .get(format!("{base}/articles/nowhere/edit"))
        .send()
        .await
        .unwrap();
    assert!(missing.text().await.unwrap().contains("No results"));
}

#[tokio::test]
async fn test_update_failure_returns_to_referer() {
    let base = spawn(slugged(), options()).await;

    let failed = client()
        .put(format!("{base}/articles/missing"))
        .header(header::REFERER, "/articles/missing/edit")
        .form(&[("id", "does-not-exist")])
        .send()
        .await
        .unwrap();
    assert_eq!(failed.status(), StatusCode::FOUND);
    assert_eq!(location(&failed), "/articles/missing/edit");
}

#[tokio::test]
async fn test_update_guards_are_plain_text_501() {
    let entity = slugged();
    let base = spawn(entity.clone(), ControllerOptions::new("/articles")).await;
    let client = client();

    let no_id = client
        .put(format!("{base}/articles/intro"))
        .form(&[("name", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(no_id.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(no_id.text().await.unwrap(), r#"Not implemented. No "id" field passed"#);

    let no_edit_view = client
        .put(format!("{base}/articles/intro"))
        .form(&[("id", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(no_edit_view.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(
        no_edit_view.text().await.unwrap(),
        r#"Not implemented. Define "editView" parameter."#
    );
    assert!(!entity.calls().contains(&"update"));
}

#[tokio::test]
async fn test_list_sees_paging_metadata() {
    let entity = slugged();
    let mut opts = options();
    opts.no_views = true;
    let base = spawn(entity.clone(), opts).await;

    for n in 0..25 {
        entity
            .inner
            .create(json!({"name": format!("Article {n}")}).as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    let page: Value = client()
        .get(format!("{base}/articles?page=3&limit=10"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["items"].as_array().unwrap().len(), 5);
    assert_eq!(page["items"][0]["name"], "Article 20");
    assert_eq!(page["paging"]["total"], 25);
    assert_eq!(page["paging"]["pages"], 3);
    assert_eq!(page["paging"]["has_next"], false);
    assert_eq!(page["paging"]["has_previous"], true);
}

#[tokio::test]
async fn test_list_html_shows_page_position() {
    let entity = slugged();
    let base = spawn(entity.clone(), options()).await;
    for n in 0..3 {
        entity
            .inner
            .create(json!({"name": format!("Post {n}")}).as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    let html = client()
        .get(format!("{base}/articles?limit=2"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Page 1 of 2"));
    assert!(html.contains("Post 1"));
    assert!(!html.contains("Post 2"));
}

#[tokio::test]
async fn test_missing_item_is_404_without_views() {
    let mut opts = options();
    opts.no_views = true;
    let base = spawn(slugged(), opts).await;

    let response = client()
        .get(format!("{base}/articles/nowhere"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_missing_item_renders_error_in_view() {
    let base = spawn(slugged(), options()).await;

    let response = client()
        .get(format!("{base}/articles/nowhere"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("No results"));
}

#[tokio::test]
async fn test_delete_never_reaches_the_entity() {
    let entity = slugged();
    let base = spawn(entity.clone(), options()).await;

    let response = client()
        .delete(format!("{base}/articles/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(response.text().await.unwrap(), "NOT IMPLEMENTED");
    assert!(entity.calls().is_empty());
}

#[tokio::test]
async fn test_owned_records_are_invisible_to_other_users() {
    let entity = slugged();
    let mut opts = options();
    opts.no_views = true;
    opts.own_user = true;
    opts.own_user_request_property = Some("user_id".to_string());
    opts.own_user_schema_property = Some("owner".to_string());
    let base = spawn(entity.clone(), opts).await;
    let client = client();

    let created = client
        .post(format!("{base}/articles"))
        .header("x-user-id", "alice")
        .form(&[("name", "Diary")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&created), "/articles/diary");

    let list = |user: &'static str| {
        client
            .get(format!("{base}/articles"))
            .header("x-user-id", user)
            .send()
    };
    let mine: Value = list("alice").await.unwrap().json().await.unwrap();
    assert_eq!(mine["items"].as_array().unwrap().len(), 1);
    assert_eq!(mine["items"][0]["owner"], "alice");

    let theirs: Value = list("bob").await.unwrap().json().await.unwrap();
    assert_eq!(theirs["items"].as_array().unwrap().len(), 0);

    let hidden = client
        .get(format!("{base}/articles/diary"))
        .header("x-user-id", "bob")
        .send()
        .await
        .unwrap();
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owned_create_without_user_is_refused() {
    let entity = slugged();
    let mut opts = options();
    opts.own_user = true;
    opts.own_user_request_property = Some("user_id".to_string());
    opts.own_user_schema_property = Some("owner".to_string());
    let base = spawn(entity.clone(), opts).await;

    let refused = client()
        .post(format!("{base}/articles"))
        .header(header::ACCEPT, "application/json")
        .json(&json!({"name": "Anonymous"}))
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::BAD_REQUEST);
    let error: Value = refused.json().await.unwrap();
    assert_eq!(error["code"], "owner_required");
    assert!(entity.calls().is_empty());
}

#[tokio::test]
async fn test_configured_base_url_with_trailing_slash_serves_created_record() {
    let opts: ControllerOptions = serde_json::from_value(json!({"base_url": "/articles/"})).unwrap();
    let base = spawn(slugged(), opts).await;
    let client = client();

    let created = client
        .post(format!("{base}/articles"))
        .form(&[("name", "Intro")])
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::FOUND);
    assert_eq!(location(&created), "/articles/intro");

    let shown = client
        .get(format!("{base}{}", location(&created)))
        .send()
        .await
        .unwrap();
    assert_eq!(shown.status(), StatusCode::OK);
}
