//! # Domain Model
//!
//! Authors, books, creation inputs and field-mapping patches.
//!
//! Records carry the column layout of the backing tables (`sqlx::FromRow`) and
//! serialize to the camelCase JSON shape served by the HTTP layer.

mod author;
mod book;
mod patch;

pub use author::{Author, AuthorPatch, AuthorWithBooks, NewAuthor};
pub use book::{Book, BookPatch, BookWithAuthor, NewBook};
pub use patch::{parse_timestamp, FieldError, FieldMap, Patch};

use std::fmt;

/// Entity identifier. Generated by the store on insert.
pub type EntityId = i64;

/// The kinds of persisted entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Author,
    Book,
}

impl EntityKind {
    /// Lowercase name used in logs and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Book => "book",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
