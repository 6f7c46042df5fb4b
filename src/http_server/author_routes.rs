//! Author HTTP Routes

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::model::{Author, AuthorWithBooks, EntityId, FieldMap, NewAuthor};

use super::errors::ApiResult;
use super::response::ApiResponse;
use super::state::AppState;

/// Create author routes
pub fn author_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/authors", get(list_authors_handler).post(create_author_handler))
        .route(
            "/api/authors/{id}",
            get(get_author_handler)
                .put(update_author_handler)
                .patch(update_author_handler)
                .delete(delete_author_handler),
        )
        .with_state(state)
}

async fn create_author_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewAuthor>, JsonRejection>,
) -> ApiResult<(StatusCode, ApiResponse<Author>)> {
    let Json(input) = body?;
    let author = state.catalog.create_author(input).await?;
    Ok(ApiResponse::created(author))
}

async fn list_authors_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<Vec<AuthorWithBooks>>> {
    Ok(ApiResponse::ok(state.catalog.list_authors().await?))
}

async fn get_author_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
) -> ApiResult<ApiResponse<AuthorWithBooks>> {
    let Path(id) = id?;
    Ok(ApiResponse::ok(state.catalog.get_author(id).await?))
}

async fn update_author_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
    body: Result<Json<FieldMap>, JsonRejection>,
) -> ApiResult<ApiResponse<AuthorWithBooks>> {
    let Path(id) = id?;
    let Json(fields) = body?;
    Ok(ApiResponse::ok(state.catalog.update_author(id, &fields).await?))
}

async fn delete_author_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
) -> ApiResult<ApiResponse<AuthorWithBooks>> {
    let Path(id) = id?;
    Ok(ApiResponse::ok(state.catalog.delete_author(id).await?))
}
