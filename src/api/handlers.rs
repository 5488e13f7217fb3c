use crate::api::controller::Controller;
use crate::api::pipeline::{Exchange, Flow, Step};
use crate::api::respond::{redirect, unimplemented_route};
use crate::api::templates::View;
use crate::error::CrudError;
use crate::logic::{final_segment, join};
use crate::model::{string_field, Message};

pub const NO_ID_FIELD: &str = r#"Not implemented. No "id" field passed"#;
pub const NO_EDIT_VIEW: &str = r#"Not implemented. Define "editView" parameter."#;
pub const DELETE_STUB: &str = "NOT IMPLEMENTED";

/// The `:id` route segment, or the last path segment when the step runs
/// outside the router.
fn item_url(exchange: &Exchange) -> &str {
    exchange
        .request
        .id
        .as_deref()
        .unwrap_or_else(|| final_segment(&exchange.request.path))
}

/// `POST {base}`: persist the body and redirect to the new record.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateItem;

#[async_trait::async_trait]
impl Step for CreateItem {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow {
        let Exchange { request, context } = exchange;
        let opts = context.options();
        let add_url = join(context.base_url(), "add");

        let created = match controller.stamp_owner(opts, &request, request.body.clone()) {
            Ok(body) => controller.entity().create(body).await,
            Err(err) => Err(err),
        };
        let created = match created {
            Ok(doc) => doc,
            Err(err) => return Flow::Respond(controller.handle_error(&request, &err, &add_url)),
        };

        let Some(url) = string_field(&created, &opts.url_field) else {
            let err = CrudError::Consistency(201);
            return Flow::Respond(controller.handle_error(&request, &err, &add_url));
        };

        request.flash.add_success(controller.success_message(opts, &created));
        Flow::Respond(redirect(&join(context.base_url(), url)))
    }
}

/// `GET {base}/add`
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateView;

#[async_trait::async_trait]
impl Step for CreateView {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow {
        let flash = &exchange.request.flash;
        let context = exchange
            .context
            .with_flash_error(flash)
            .with_flash_success(flash);

        let view = match context.options().edit_view {
            Some(_) => View::Edit,
            None => View::Add,
        };
        Flow::Respond(controller.render(view, &context))
    }
}

/// `GET {base}`: renders whatever pagination attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadList;

#[async_trait::async_trait]
impl Step for ReadList {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow {
        Flow::Respond(controller.render(View::List, &exchange.context))
    }
}

/// `GET {base}/:id`, looked up by the url field. Lookup failures are shown
/// inside the item view rather than redirected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOne;

#[async_trait::async_trait]
impl Step for ReadOne {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow {
        let opts = exchange.context.options();
        let lookup = controller.url_lookup(opts, &exchange.request, item_url(&exchange));

        let found = controller.entity().read_one(lookup).await;
        let context = match found {
            Ok(doc) => exchange
                .context
                .with_item(controller.sanitize(doc))
                .with_flash_success(&exchange.request.flash),
            Err(err) => {
                log::debug!("No item at {}: {}", exchange.request.path, err);
                exchange.context.with_error(Message::from(&err))
            }
        };
        Flow::Respond(controller.render(View::Item, &context))
    }
}

/// `PUT|POST {base}/:id`
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateItem;

#[async_trait::async_trait]
impl Step for UpdateItem {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow {
        let Exchange { request, context } = exchange;
        let opts = context.options();

        let Some(id) = request.body_id() else {
            return Flow::Respond(unimplemented_route(NO_ID_FIELD));
        };
        if opts.edit_view.is_none() {
            return Flow::Respond(unimplemented_route(NO_EDIT_VIEW));
        }

        let lookup = controller.id_lookup(opts, &request, id);
        let updated = match controller.entity().update(lookup, controller.process(&request.body)).await {
            Ok(doc) => doc,
            Err(err) => {
                let back = request.referer().unwrap_or(request.path.as_str()).to_string();
                return Flow::Respond(controller.handle_error(&request, &err, &back));
            }
        };

        // A changed url field moves the record, so send the client along.
        match string_field(&updated, &opts.url_field) {
            Some(url) if url != final_segment(&request.path) => {
                request.flash.add_success(controller.success_message(opts, &updated));
                Flow::Respond(redirect(&join(context.base_url(), url)))
            }
            _ => {
                let success = controller.success_message(opts, &updated);
                let context = context
                    .with_success(success)
                    .with_item(controller.sanitize(updated));
                Flow::Respond(controller.render(View::Item, &context))
            }
        }
    }
}

/// `GET {base}/:id/edit`
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateView;

#[async_trait::async_trait]
impl Step for UpdateView {
    async fn run(&self, controller: &Controller, exchange: Exchange) -> Flow {
        let opts = exchange.context.options();
        if opts.edit_view.is_none() {
            return Flow::Respond(unimplemented_route(NO_EDIT_VIEW));
        }

        let lookup = controller.url_lookup(opts, &exchange.request, item_url(&exchange));
        let found = controller.entity().read_one(lookup).await;
        let context = match found {
            Ok(doc) => exchange
                .context
                .with_item(controller.sanitize(doc))
                .with_flash_error(&exchange.request.flash),
            Err(err) => exchange.context.with_error(Message::from(&err)),
        };
        Flow::Respond(controller.render(View::Edit, &context))
    }
}

/// `DELETE {base}/:id`. Deletion is not offered; storage is never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteItem;

#[async_trait::async_trait]
impl Step for DeleteItem {
    async fn run(&self, _controller: &Controller, _exchange: Exchange) -> Flow {
        Flow::Respond(unimplemented_route(DELETE_STUB))
    }
}
