use std::fmt;
use std::sync::Arc;

use axum::response::Response;

use crate::api::context::RequestContext;
use crate::api::controller::Controller;
use crate::api::request::CrudRequest;
use crate::api::respond;

/// The request together with the context accumulated by earlier steps.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: CrudRequest,
    pub context: RequestContext,
}

impl Exchange {
    pub fn new(request: CrudRequest) -> Self {
        Self {
            request,
            context: RequestContext::default(),
        }
    }

    pub fn with_context(self, context: RequestContext) -> Self {
        Self { context, ..self }
    }
}

/// What a step decided: hand over to the next step, or answer right away.
pub enum Flow {
    Next(Exchange),
    Respond(Response),
}

/// One link of an operation pipeline.
#[async_trait::async_trait]
pub trait Step: Send + Sync {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow;
}

/// An ordered chain of steps for one CRUD operation. Steps run strictly in
/// order; the first one to respond ends the chain.
#[derive(Clone)]
pub struct Pipeline {
    name: &'static str,
    steps: Vec<Arc<dyn Step>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Insert a step in front of every existing one.
    pub fn unshift(&mut self, step: Arc<dyn Step>) {
        self.steps.insert(0, step);
    }

    pub fn push(&mut self, step: Arc<dyn Step>) {
        self.steps.push(step);
    }

    pub async fn run(&self, controller: &Controller, request: CrudRequest) -> Response {
        log::debug!("{} {} -> pipeline '{}'", request.method, request.path, self.name);

        let mut exchange = Exchange::new(request);
        for step in &self.steps {
            match step.run(controller, exchange).await {
                Flow::Next(next) => exchange = next,
                Flow::Respond(response) => return response,
            }
        }

        log::warn!("Pipeline '{}' finished without a response", self.name);
        respond::unimplemented_route("Not implemented. No handler responded.")
    }
}
