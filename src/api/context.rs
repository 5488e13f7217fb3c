use std::sync::Arc;

use serde::Serialize;

use crate::api::controller::Controller;
use crate::api::flash::FlashSession;
use crate::api::pagination::Paging;
use crate::api::pipeline::{Exchange, Flow, Step};
use crate::logic::{resolve_base_url, SchemaView};
use crate::model::{ControllerOptions, Document, Message, UserContext};

/// Options as the views see them: the controller options plus the base URL
/// the current request resolved to.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderedOptions {
    #[serde(flatten)]
    pub options: ControllerOptions,
    pub rendered_base_url: String,
}

/// Per-request rendering state, threaded by value through the pipeline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestContext {
    pub opts: RenderedOptions,
    pub schema: Arc<SchemaView>,
    pub current_user: Option<UserContext>,
    pub item: Option<Document>,
    pub items: Vec<Document>,
    pub paging: Option<Paging>,
    pub error: Option<Message>,
    pub success: Option<Message>,
}

impl RequestContext {
    pub fn options(&self) -> &ControllerOptions {
        &self.opts.options
    }

    pub fn base_url(&self) -> &str {
        &self.opts.rendered_base_url
    }

    pub fn with_item(self, item: Document) -> Self {
        Self {
            item: Some(item),
            ..self
        }
    }

    pub fn with_items(self, items: Vec<Document>, paging: Paging) -> Self {
        Self {
            items,
            paging: Some(paging),
            ..self
        }
    }

    pub fn with_error(self, error: Message) -> Self {
        Self {
            error: Some(error),
            ..self
        }
    }

    pub fn with_success(self, success: Message) -> Self {
        Self {
            success: Some(success),
            ..self
        }
    }

    /// Move a pending flash error into the context, if there is one.
    pub fn with_flash_error(self, flash: &FlashSession) -> Self {
        match flash.take_error() {
            Some(error) => self.with_error(error),
            None => self,
        }
    }

    pub fn with_flash_success(self, flash: &FlashSession) -> Self {
        match flash.take_success() {
            Some(success) => self.with_success(success),
            None => self,
        }
    }
}

/// First step of every pipeline: fills options, schema view and current user.
#[derive(Debug, Clone, Copy)]
pub struct PrepareContext {
    /// Strip the trailing item id when resolving the base URL.
    pub item_scoped: bool,
}

impl PrepareContext {
    pub fn collection() -> Self {
        Self { item_scoped: false }
    }

    pub fn item() -> Self {
        Self { item_scoped: true }
    }
}

#[async_trait::async_trait]
impl Step for PrepareContext {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow {
        let rendered_base_url = resolve_base_url(&exchange.request.path, self.item_scoped);
        let context = RequestContext {
            opts: RenderedOptions {
                options: controller.options(),
                rendered_base_url,
            },
            schema: controller.schema(),
            current_user: exchange.request.user.clone(),
            ..RequestContext::default()
        };
        Flow::Next(exchange.with_context(context))
    }
}
