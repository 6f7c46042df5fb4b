//! # HTTP Server Module
//!
//! REST API over the catalog.
//!
//! # Endpoints
//!
//! - `/health` - Health check (pings the database)
//! - `/metrics` - Request counters
//! - `/api/authors`, `/api/authors/{id}` - Authors with their books
//! - `/api/books`, `/api/books/{id}` - Books with their author
//!
//! Responses use `{ "success": true, "data": ... }` or
//! `{ "success": false, "error": ..., "code": ... }`.

pub mod author_routes;
pub mod book_routes;
pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod response;
pub mod server;
mod state;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use response::ApiResponse;
pub use server::HttpServer;
pub use state::AppState;
