use std::sync::Arc;

use axum::Router;

use crate::api::context::PrepareContext;
use crate::api::controller::{Controller, Hooks};
use crate::api::handlers::{CreateItem, CreateView, DeleteItem, ReadList, ReadOne, UpdateItem, UpdateView};
use crate::api::pagination::Paginate;
use crate::api::pipeline::{Pipeline, Step};
use crate::api::routes;
use crate::error::CrudResult;
use crate::model::ControllerOptions;
use crate::store::Entity;

/// One pipeline per CRUD operation.
#[derive(Debug, Clone)]
pub struct Pipelines {
    pub create: Pipeline,
    pub create_view: Pipeline,
    pub read_list: Pipeline,
    pub read_one: Pipeline,
    pub update: Pipeline,
    pub update_view: Pipeline,
    pub delete: Pipeline,
}

impl Default for Pipelines {
    fn default() -> Self {
        Self {
            create: Pipeline::new("create")
                .step(PrepareContext::collection())
                .step(CreateItem),
            create_view: Pipeline::new("create_view")
                .step(PrepareContext::collection())
                .step(CreateView),
            read_list: Pipeline::new("read_list")
                .step(PrepareContext::collection())
                .step(Paginate)
                .step(ReadList),
            read_one: Pipeline::new("read_one")
                .step(PrepareContext::item())
                .step(ReadOne),
            update: Pipeline::new("update")
                .step(PrepareContext::item())
                .step(UpdateItem),
            update_view: Pipeline::new("update_view")
                .step(PrepareContext::item())
                .step(UpdateView),
            delete: Pipeline::new("delete").step(DeleteItem),
        }
    }
}

impl Pipelines {
    pub fn all_mut(&mut self) -> [&mut Pipeline; 7] {
        [
            &mut self.create,
            &mut self.create_view,
            &mut self.read_list,
            &mut self.read_one,
            &mut self.update,
            &mut self.update_view,
            &mut self.delete,
        ]
    }
}

/// A CRUD resource: a controller plus the pipelines that drive it.
#[derive(Debug)]
pub struct Crud {
    controller: Controller,
    pub pipelines: Pipelines,
}

impl Crud {
    pub fn new(entity: Arc<dyn Entity>, options: ControllerOptions) -> CrudResult<Self> {
        Ok(Self {
            controller: Controller::new(entity, options)?,
            pipelines: Pipelines::default(),
        })
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.controller = self.controller.with_hooks(hooks);
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Run `step` first on every route.
    pub fn unshift_all_routes(&mut self, step: Arc<dyn Step>) {
        for pipeline in self.pipelines.all_mut() {
            pipeline.unshift(step.clone());
        }
    }

    /// Append `step` to every route. A pushed step only runs when the step
    /// before it advances. The built-in operation steps always respond, so
    /// on the default pipelines it runs only after a replaced final step.
    pub fn push_all_routes(&mut self, step: Arc<dyn Step>) {
        for pipeline in self.pipelines.all_mut() {
            pipeline.push(step.clone());
        }
    }

    pub fn into_router(self) -> Router {
        routes::create_router(Arc::new(self))
    }
}
