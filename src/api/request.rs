use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, OriginalUri, Query, Request},
    http::{header, HeaderMap, Method},
    Form, Json,
};
use serde_json::Value;

use crate::api::flash::{FlashSession, FlashStore};
use crate::api::respond::ResponseFormat;
use crate::error::{CrudError, CrudResult};
use crate::model::{Document, UserContext};

/// Everything a pipeline step needs to know about the inbound request.
#[derive(Debug, Clone)]
pub struct CrudRequest {
    pub method: Method,
    /// Full request path, before any router nesting was stripped.
    pub path: String,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    /// The `:id` route segment on item-scoped routes.
    pub id: Option<String>,
    pub body: Document,
    pub user: Option<UserContext>,
    pub flash: FlashSession,
}

impl CrudRequest {
    pub async fn from_axum(
        request: Request,
        id: Option<String>,
        user: Option<UserContext>,
        flash_store: Arc<FlashStore>,
    ) -> CrudResult<Self> {
        let method = request.method().clone();
        let headers = request.headers().clone();
        let path = request
            .extensions()
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.path().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());
        let query = Query::<HashMap<String, String>>::try_from_uri(request.uri())
            .map(|Query(query)| query)
            .unwrap_or_default();
        let flash = FlashSession::from_headers(&headers, flash_store);

        let body = if method == Method::POST || method == Method::PUT || method == Method::PATCH {
            read_body(request, &headers).await?
        } else {
            Document::new()
        };

        Ok(Self {
            method,
            path,
            headers,
            query,
            id,
            body,
            user,
            flash,
        })
    }

    pub fn format(&self) -> ResponseFormat {
        ResponseFormat::negotiate(&self.headers)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn referer(&self) -> Option<&str> {
        self.header(header::REFERER.as_str())
            .filter(|referer| !referer.is_empty())
    }

    /// `body.id` as a string, numbers included.
    pub fn body_id(&self) -> Option<String> {
        match self.body.get("id")? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

async fn read_body(request: Request, headers: &HeaderMap) -> CrudResult<Document> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok());

    match content_type {
        Some(ct) if ct.subtype() == mime::JSON || ct.suffix() == Some(mime::JSON) => {
            let Json(body) = Json::<Document>::from_request(request, &())
                .await
                .map_err(|rejection| CrudError::InvalidBody(rejection.body_text()))?;
            Ok(body)
        }
        Some(ct) if ct.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() => {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(request, &())
                .await
                .map_err(|rejection| CrudError::InvalidBody(rejection.body_text()))?;
            Ok(fields
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect())
        }
        _ => Ok(Document::new()),
    }
}
