use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::api::flash::FlashStore;
use crate::api::request::CrudRequest;
use crate::api::templates::Templates;
use crate::error::{CrudError, CrudResult};
use crate::logic::{self, SchemaView, SchemaViewCache};
use crate::model::{query_for, string_field, ControllerOptions, Document, Lookup, Message, Query};
use crate::store::Entity;

/// Rewrites the list query right before pagination runs.
pub type QueryHook = Arc<dyn Fn(&CrudRequest, Query) -> Query + Send + Sync>;

/// Replaces the built-in sanitizer for every record headed for a view.
pub type SanitizeHook = Arc<dyn Fn(Document) -> Document + Send + Sync>;

#[derive(Clone, Default)]
pub struct Hooks {
    pub paginate_query: Option<QueryHook>,
    pub sanitize_result: Option<SanitizeHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("paginate_query", &self.paginate_query.is_some())
            .field("sanitize_result", &self.sanitize_result.is_some())
            .finish()
    }
}

/// Shared state of one CRUD resource: the entity, its options and
/// everything computed from them once.
pub struct Controller {
    entity: Arc<dyn Entity>,
    options: RwLock<ControllerOptions>,
    hooks: Hooks,
    pub(crate) templates: Templates,
    schema_views: SchemaViewCache,
    flash_store: Arc<FlashStore>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("entity", &self.entity.schema().name)
            .field("options", &*self.options.read())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Controller {
    /// Validates the options and compiles every template. Broken template
    /// files fail here, never at request time.
    pub fn new(entity: Arc<dyn Entity>, options: ControllerOptions) -> CrudResult<Self> {
        let options = options.normalized();
        if options.own_user && options.ownership().is_none() {
            return Err(CrudError::Config(
                "own_user requires own_user_request_property and own_user_schema_property"
                    .to_string(),
            ));
        }

        let templates = Templates::compile(&options)?;
        log::info!(
            "CRUD controller for '{}' mounted at {}",
            entity.schema().name,
            options.base_url
        );

        Ok(Self {
            entity,
            options: RwLock::new(options),
            hooks: Hooks::default(),
            templates,
            schema_views: SchemaViewCache::new(),
            flash_store: Arc::new(FlashStore::new()),
        })
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_flash_store(mut self, flash_store: Arc<FlashStore>) -> Self {
        self.flash_store = flash_store;
        self
    }

    pub fn entity(&self) -> &dyn Entity {
        self.entity.as_ref()
    }

    /// A snapshot of the options for the current request.
    pub fn options(&self) -> ControllerOptions {
        self.options.read().clone()
    }

    /// Change options at runtime. Template paths are only read at
    /// construction, so changing them here has no effect on rendering.
    pub fn update_options(&self, update: impl FnOnce(&mut ControllerOptions)) {
        update(&mut self.options.write());
    }

    pub fn schema(&self) -> Arc<SchemaView> {
        self.schema_views
            .get(self.entity.schema(), &self.options.read())
    }

    pub fn flash_store(&self) -> Arc<FlashStore> {
        self.flash_store.clone()
    }

    pub fn process(&self, params: &Document) -> Document {
        logic::process(params)
    }

    pub fn sanitize(&self, doc: Document) -> Document {
        match &self.hooks.sanitize_result {
            Some(hook) => hook(doc),
            None => logic::sanitize(doc),
        }
    }

    /// Owner field and value for the current request. Without a current
    /// user the value is `null`. Owned writes are refused without a user,
    /// so `null` matches no stored record.
    pub fn owner(&self, opts: &ControllerOptions, request: &CrudRequest) -> Option<(String, Value)> {
        let (request_property, schema_property) = opts.ownership()?;
        let value = request
            .user
            .as_ref()
            .and_then(|user| user.property(request_property))
            .unwrap_or(Value::Null);
        Some((schema_property.to_string(), value))
    }

    /// Add the owner constraint to a query when ownership is enforced.
    pub fn scope_query(&self, opts: &ControllerOptions, request: &CrudRequest, mut query: Query) -> Query {
        if let Some((field, value)) = self.owner(opts, request) {
            query.insert(field, value);
        }
        query
    }

    pub fn list_query(&self, opts: &ControllerOptions, request: &CrudRequest) -> Query {
        let query = self.scope_query(opts, request, Query::new());
        match &self.hooks.paginate_query {
            Some(hook) => hook(request, query),
            None => query,
        }
    }

    /// Record addressed by the url field, as on item routes.
    pub fn url_lookup(&self, opts: &ControllerOptions, request: &CrudRequest, url: &str) -> Lookup {
        Lookup::Query(self.scope_query(opts, request, query_for(&opts.url_field, url)))
    }

    /// Record addressed by its id. Falls back to a query when ownership
    /// has to be checked as well.
    pub fn id_lookup(&self, opts: &ControllerOptions, request: &CrudRequest, id: String) -> Lookup {
        match self.owner(opts, request) {
            Some(_) => Lookup::Query(self.scope_query(opts, request, query_for(&opts.id_field, id))),
            None => Lookup::Id(id),
        }
    }

    /// Stamp the owner onto a record about to be created. Fails with
    /// `OwnerRequired` when ownership is enforced and nobody is signed in.
    pub fn stamp_owner(
        &self,
        opts: &ControllerOptions,
        request: &CrudRequest,
        mut doc: Document,
    ) -> CrudResult<Document> {
        if let Some((field, value)) = self.owner(opts, request) {
            if value.is_null() {
                return Err(CrudError::OwnerRequired);
            }
            doc.insert(field, value);
        }
        Ok(doc)
    }

    pub fn success_message(&self, opts: &ControllerOptions, doc: &Document) -> Message {
        match string_field(doc, &opts.name_field) {
            Some(name) => Message::success(format!("\"{name}\" saved")),
            None => Message::success("Record saved"),
        }
    }
}
