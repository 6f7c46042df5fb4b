//! Book HTTP Routes
//!
//! Every book in a response carries its author.

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

use crate::model::{BookWithAuthor, EntityId, FieldMap, NewBook};

use super::errors::ApiResult;
use super::response::ApiResponse;
use super::state::AppState;

/// Create book routes
pub fn book_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/books", get(list_books_handler).post(create_book_handler))
        .route(
            "/api/books/{id}",
            get(get_book_handler)
                .put(update_book_handler)
                .patch(update_book_handler)
                .delete(delete_book_handler),
        )
        .with_state(state)
}

async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewBook>, JsonRejection>,
) -> ApiResult<(StatusCode, ApiResponse<BookWithAuthor>)> {
    let Json(input) = body?;
    let book = state.catalog.create_book(input).await?;
    Ok(ApiResponse::created(book))
}

async fn list_books_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<Vec<BookWithAuthor>>> {
    Ok(ApiResponse::ok(state.catalog.list_books().await?))
}

async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
) -> ApiResult<ApiResponse<BookWithAuthor>> {
    let Path(id) = id?;
    Ok(ApiResponse::ok(state.catalog.get_book(id).await?))
}

async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
    body: Result<Json<FieldMap>, JsonRejection>,
) -> ApiResult<ApiResponse<BookWithAuthor>> {
    let Path(id) = id?;
    let Json(fields) = body?;
    Ok(ApiResponse::ok(state.catalog.update_book(id, &fields).await?))
}

async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
) -> ApiResult<ApiResponse<BookWithAuthor>> {
    let Path(id) = id?;
    Ok(ApiResponse::ok(state.catalog.delete_book(id).await?))
}
