use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::api::crud::Crud;
use crate::api::pipeline::Pipeline;
use crate::api::request::CrudRequest;
use crate::api::user_extractor::CurrentUser;
use crate::model::UserContext;

pub type AppState = Arc<Crud>;

pub fn create_router(crud: AppState) -> Router {
    let base = crud.controller().options().base_url;
    let collection = if base.is_empty() { "/".to_string() } else { base.clone() };
    let item = format!("{}/:id", base);

    Router::new()
        .route(&collection, get(read_list).post(create))
        .route(&format!("{}/add", base), get(create_view))
        .route(&item, get(read_one).put(update).post(update).delete(delete))
        .route(&format!("{}/edit", item), get(update_view))
        .with_state(crud)
}

async fn create(State(crud): State<AppState>, CurrentUser(user): CurrentUser, request: Request) -> Response {
    dispatch(&crud, &crud.pipelines.create, None, user, request).await
}

async fn create_view(
    State(crud): State<AppState>,
    CurrentUser(user): CurrentUser,
    request: Request,
) -> Response {
    dispatch(&crud, &crud.pipelines.create_view, None, user, request).await
}

async fn read_list(State(crud): State<AppState>, CurrentUser(user): CurrentUser, request: Request) -> Response {
    dispatch(&crud, &crud.pipelines.read_list, None, user, request).await
}

async fn read_one(
    State(crud): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    dispatch(&crud, &crud.pipelines.read_one, Some(id), user, request).await
}

async fn update(
    State(crud): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    dispatch(&crud, &crud.pipelines.update, Some(id), user, request).await
}

async fn update_view(
    State(crud): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    dispatch(&crud, &crud.pipelines.update_view, Some(id), user, request).await
}

async fn delete(
    State(crud): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    dispatch(&crud, &crud.pipelines.delete, Some(id), user, request).await
}

/// Convert the axum request, run the pipeline and hand out the session
/// cookie when this request started a new session.
async fn dispatch(
    crud: &Crud,
    pipeline: &Pipeline,
    id: Option<String>,
    user: Option<UserContext>,
    request: Request,
) -> Response {
    let controller = crud.controller();
    let request = match CrudRequest::from_axum(request, id, user, controller.flash_store()).await {
        Ok(request) => request,
        Err(err) => {
            log::warn!("Rejected request for pipeline '{}': {}", pipeline.name(), err);
            return (StatusCode::BAD_REQUEST, Json(err.to_response())).into_response();
        }
    };

    let session_cookie = request.flash.set_cookie();
    let mut response = pipeline.run(controller, request).await;
    if let Some(cookie) = session_cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
