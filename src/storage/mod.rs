//! Storage subsystem
//!
//! SQLite persistence through `sqlx`. Every repository operation takes a
//! `&mut SqliteConnection`, so the same call runs standalone on a pooled
//! connection or inside a transaction owned by the caller.

mod authors;
mod books;
mod config;
mod errors;
mod schema;
mod store;

pub use authors::AuthorRepository;
pub use books::BookRepository;
pub use config::DatabaseConfig;
pub use errors::{ErrorKind, StoreError, StoreResult};
pub use schema::ensure_schema;
pub use store::Store;

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::model::{EntityId, EntityKind, Patch};

/// Per-entity operations the mutator drives inside its transaction
#[async_trait]
pub trait Repository: Send + Sync {
    /// What callers get back, with related entities joined in
    type Record: Send + Sync;

    /// Typed partial update
    type Patch: Patch;

    const KIND: EntityKind;

    /// Read one entity, `None` if absent
    async fn find_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: EntityId,
    ) -> StoreResult<Option<Self::Record>>;

    /// Apply a patch to an existing entity
    async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: EntityId,
        patch: &Self::Patch,
    ) -> StoreResult<Self::Record>;

    /// Remove an entity, returning what was removed
    async fn delete(&self, conn: &mut SqliteConnection, id: EntityId)
        -> StoreResult<Self::Record>;

    /// Refuse deletion of a record that must stay. Runs after the existence check.
    async fn ensure_removable(
        &self,
        _conn: &mut SqliteConnection,
        _record: &Self::Record,
    ) -> StoreResult<()> {
        Ok(())
    }
}
