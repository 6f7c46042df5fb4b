//! # Transactional Entity Mutator
//!
//! Applies a change to a persisted entity only if that entity exists at the
//! moment of the change. The existence check and the write run in one
//! transaction on the writer connection:
//!
//! 1. begin
//! 2. read the entity by id; absent → roll back, `NotFound`
//! 3. write (update, or guarded delete)
//! 4. commit
//!
//! The mutator never retries. Every failure reaches the caller as a typed
//! [`StoreError`] and leaves no partial write behind: an uncommitted
//! transaction is rolled back explicitly on the not-found path and by drop
//! on every other path.

mod state;

pub use state::{MutationState, MutationTrace, Operation};

use sqlx::{Sqlite, Transaction};

use crate::model::EntityId;
use crate::storage::{Repository, Store, StoreError, StoreResult};

/// Existence-checked update and delete over any [`Repository`]
#[derive(Debug, Clone)]
pub struct Mutator {
    store: Store,
}

impl Mutator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Apply `patch` to entity `id` if it exists
    ///
    /// Returns the updated entity with related entities joined in.
    pub async fn update<R: Repository>(
        &self,
        repo: &R,
        id: EntityId,
        patch: &R::Patch,
    ) -> StoreResult<R::Record> {
        let mut trace = MutationTrace::start(R::KIND, id, Operation::Update);
        let result = self.run_update(repo, id, patch, &mut trace).await;
        trace.finish(&result);
        result
    }

    /// Delete entity `id` if it exists and the repository allows it
    ///
    /// Returns the entity as it was before removal.
    pub async fn delete<R: Repository>(&self, repo: &R, id: EntityId) -> StoreResult<R::Record> {
        let mut trace = MutationTrace::start(R::KIND, id, Operation::Delete);
        let result = self.run_delete(repo, id, &mut trace).await;
        trace.finish(&result);
        result
    }

    async fn run_update<R: Repository>(
        &self,
        repo: &R,
        id: EntityId,
        patch: &R::Patch,
        trace: &mut MutationTrace,
    ) -> StoreResult<R::Record> {
        let mut tx = self.store.begin().await?;

        if check_exists(repo, &mut tx, id, trace).await?.is_none() {
            return Err(abort_not_found::<R>(tx, id).await);
        }

        trace.advance(MutationState::Writing);
        let record = repo.update(&mut tx, id, patch).await?;

        tx.commit().await?;
        trace.advance(MutationState::Committed);
        Ok(record)
    }

    async fn run_delete<R: Repository>(
        &self,
        repo: &R,
        id: EntityId,
        trace: &mut MutationTrace,
    ) -> StoreResult<R::Record> {
        let mut tx = self.store.begin().await?;

        let Some(current) = check_exists(repo, &mut tx, id, trace).await? else {
            return Err(abort_not_found::<R>(tx, id).await);
        };

        repo.ensure_removable(&mut tx, &current).await?;

        trace.advance(MutationState::Writing);
        let removed = repo.delete(&mut tx, id).await?;

        tx.commit().await?;
        trace.advance(MutationState::Committed);
        Ok(removed)
    }
}

async fn check_exists<R: Repository>(
    repo: &R,
    tx: &mut Transaction<'static, Sqlite>,
    id: EntityId,
    trace: &mut MutationTrace,
) -> StoreResult<Option<R::Record>> {
    trace.advance(MutationState::Checking);
    let current = repo.find_by_id(tx, id).await?;
    trace.advance(if current.is_some() {
        MutationState::Found
    } else {
        MutationState::NotFound
    });
    Ok(current)
}

async fn abort_not_found<R: Repository>(tx: Transaction<'static, Sqlite>, id: EntityId) -> StoreError {
    if let Err(err) = tx.rollback().await {
        // The connection is discarded by the pool; NotFound is still the answer.
        tracing::warn!(entity = %R::KIND, id, error = %err, "rollback failed");
    }
    StoreError::not_found(R::KIND, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuthorPatch, NewAuthor};
    use crate::storage::AuthorRepository;

    #[tokio::test]
    async fn test_update_existing_author() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.writer().await.unwrap();
        let author = AuthorRepository
            .create(&mut conn, &NewAuthor::new("A"))
            .await
            .unwrap();
        drop(conn);

        let mutator = Mutator::new(store);
        let patch = AuthorPatch {
            name: Some("B".to_string()),
        };
        let updated = mutator.update(&AuthorRepository, author.id, &patch).await.unwrap();
        assert_eq!(updated.author.name, "B");
        assert!(updated.books.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_author() {
        let store = Store::in_memory().await.unwrap();
        let mutator = Mutator::new(store);
        let patch = AuthorPatch {
            name: Some("B".to_string()),
        };
        let err = mutator.update(&AuthorRepository, 9, &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 9, .. }));
    }

    #[tokio::test]
    async fn test_connection_released_after_not_found() {
        let store = Store::in_memory().await.unwrap();
        let mutator = Mutator::new(store.clone());

        let _ = mutator.delete(&AuthorRepository, 1).await;
        // The single in-memory connection must be back in the pool.
        assert!(store.ping().await.is_ok());
    }
}
