use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::api::context::RequestContext;
use crate::api::controller::Controller;
use crate::api::pagination::Paging;
use crate::api::request::CrudRequest;
use crate::api::templates::View;
use crate::error::CrudError;
use crate::model::{Document, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Html,
}

impl ResponseFormat {
    /// Decided by the first media range of `Accept` only.
    pub fn negotiate(headers: &HeaderMap) -> Self {
        let first = headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .and_then(|accept| accept.split(',').next())
            .and_then(|range| range.trim().parse::<mime::Mime>().ok());

        match first {
            Some(range) if range.subtype() == mime::JSON || range.suffix() == Some(mime::JSON) => {
                ResponseFormat::Json
            }
            _ => ResponseFormat::Html,
        }
    }
}

/// Body sent instead of a rendered view when views are disabled.
#[derive(Debug, Serialize)]
struct ViewPayload<'a> {
    item: &'a Option<Document>,
    items: &'a [Document],
    paging: &'a Option<Paging>,
    error: &'a Option<Message>,
    success: &'a Option<Message>,
}

impl Controller {
    /// JSON clients get `400 {code, message}`, everybody else a flash error
    /// and a redirect.
    pub fn handle_error(&self, request: &CrudRequest, err: &CrudError, redirect_url: &str) -> Response {
        log::warn!("{} {} failed: {}", request.method, request.path, err);

        match request.format() {
            ResponseFormat::Json => (StatusCode::BAD_REQUEST, Json(err.to_response())).into_response(),
            ResponseFormat::Html => {
                request.flash.add_error(Message::from(err));
                redirect(redirect_url)
            }
        }
    }

    pub fn render(&self, view: View, ctx: &RequestContext) -> Response {
        if ctx.options().no_views {
            let status = match &ctx.error {
                Some(error) if error.is_not_found() => StatusCode::NOT_FOUND,
                _ => StatusCode::OK,
            };
            let payload = ViewPayload {
                item: &ctx.item,
                items: &ctx.items,
                paging: &ctx.paging,
                error: &ctx.error,
                success: &ctx.success,
            };
            return (status, Json(payload)).into_response();
        }

        match self.templates.render(view, ctx) {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                log::error!("Failed to render {}: {}", view.template_name(), err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

pub fn redirect(url: &str) -> Response {
    match HeaderValue::from_str(url) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            log::warn!("Refusing to redirect to invalid location {:?}", url);
            (StatusCode::BAD_REQUEST, "Invalid redirect location").into_response()
        }
    }
}

pub fn unimplemented_route(message: &str) -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message.to_string(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request::test_support;
    use crate::model::{ControllerOptions, ModelSchema};
    use crate::store::MemoryEntity;
    use std::sync::Arc;

    fn controller(opts: ControllerOptions) -> Controller {
        Controller::new(Arc::new(MemoryEntity::new(ModelSchema::new("articles"))), opts).unwrap()
    }

    fn headers(accept: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_str(accept).unwrap());
        headers
    }

    #[test]
    fn test_negotiate_uses_first_media_range() {
        assert_eq!(ResponseFormat::negotiate(&headers("application/json")), ResponseFormat::Json);
        assert_eq!(
            ResponseFormat::negotiate(&headers("application/vnd.api+json, text/html")),
            ResponseFormat::Json
        );
        assert_eq!(
            ResponseFormat::negotiate(&headers("text/html, application/json")),
            ResponseFormat::Html
        );
        assert_eq!(ResponseFormat::negotiate(&HeaderMap::new()), ResponseFormat::Html);
    }

    #[test]
    fn test_handle_error_json() {
        let controller = controller(ControllerOptions::new("/articles"));
        let mut request = test_support::request("/articles");
        request.headers = headers("application/json");

        let response = controller.handle_error(&request, &CrudError::Consistency(201), "/articles/add");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(request.flash.take_error().is_none());
    }

    #[test]
    fn test_handle_error_html_flashes_and_redirects() {
        let controller = controller(ControllerOptions::new("/articles"));
        let request = test_support::request("/articles");

        let response = controller.handle_error(&request, &CrudError::NotFound, "/articles/add");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/articles/add");
        assert_eq!(request.flash.take_error().unwrap().text, "No results");
    }

    #[test]
    fn test_no_views_not_found_is_404() {
        let mut opts = ControllerOptions::new("/articles");
        opts.no_views = true;
        let controller = controller(opts.clone());
        let mut ctx = RequestContext::default().with_error(Message::from(&CrudError::NotFound));
        ctx.opts.options = opts;

        let response = controller.render(View::Item, &ctx);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unimplemented_route_is_plain_text() {
        let response = unimplemented_route("NOT IMPLEMENTED");
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
