//! shelf - a REST service for authors and their books
//!
//! Authors own books. Updates and deletes run through an existence-checked
//! transactional mutator so a change is applied only to an entity that exists
//! when the change commits.

pub mod catalog;
pub mod cli;
pub mod http_server;
pub mod model;
pub mod mutator;
pub mod observability;
pub mod storage;
