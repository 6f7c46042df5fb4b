//! # Catalog
//!
//! The full CRUD surface for authors and books over one injected [`Store`].
//! Updates and deletes go through the [`Mutator`]; creates run on the writer
//! connection; reads use the reader pool.
//!
//! Every failure is logged with the entity kind, the identifier (when there
//! is one) and the failure code before it is returned.

use crate::model::{
    Author, AuthorPatch, AuthorWithBooks, BookPatch, BookWithAuthor, EntityId, EntityKind,
    FieldMap, NewAuthor, NewBook, Patch,
};
use crate::mutator::Mutator;
use crate::storage::{AuthorRepository, BookRepository, Store, StoreError, StoreResult};

/// Authors and books service
#[derive(Debug, Clone)]
pub struct Catalog {
    store: Store,
    mutator: Mutator,
}

impl Catalog {
    pub fn new(store: Store) -> Self {
        Self {
            mutator: Mutator::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ==================
    // Authors
    // ==================

    pub async fn create_author(&self, input: NewAuthor) -> StoreResult<Author> {
        let result = async {
            let input = input.validated()?;
            let mut conn = self.store.writer().await?;
            AuthorRepository.create(&mut conn, &input).await
        }
        .await;
        logged(result, EntityKind::Author, "create", None)
    }

    pub async fn list_authors(&self) -> StoreResult<Vec<AuthorWithBooks>> {
        let result = async {
            let mut conn = self.store.reader().await?;
            AuthorRepository.list_with_books(&mut conn).await
        }
        .await;
        logged(result, EntityKind::Author, "list", None)
    }

    pub async fn get_author(&self, id: EntityId) -> StoreResult<AuthorWithBooks> {
        let result = async {
            let mut conn = self.store.reader().await?;
            AuthorRepository
                .find_with_books(&mut conn, id)
                .await?
                .ok_or(StoreError::not_found(EntityKind::Author, id))
        }
        .await;
        logged(result, EntityKind::Author, "get", Some(id))
    }

    pub async fn update_author(
        &self,
        id: EntityId,
        fields: &FieldMap,
    ) -> StoreResult<AuthorWithBooks> {
        let patch = logged(
            AuthorPatch::from_fields(fields).map_err(StoreError::from),
            EntityKind::Author,
            "update",
            Some(id),
        )?;
        self.mutator.update(&AuthorRepository, id, &patch).await
    }

    /// Rejected with a conflict while the author still owns books
    pub async fn delete_author(&self, id: EntityId) -> StoreResult<AuthorWithBooks> {
        self.mutator.delete(&AuthorRepository, id).await
    }

    // ==================
    // Books
    // ==================

    pub async fn create_book(&self, input: NewBook) -> StoreResult<BookWithAuthor> {
        let result = async {
            let input = input.validated()?;
            let mut tx = self.store.begin().await?;
            let book = BookRepository.create(&mut tx, &input).await?;
            tx.commit().await?;
            Ok::<_, StoreError>(book)
        }
        .await;
        logged(result, EntityKind::Book, "create", None)
    }

    pub async fn list_books(&self) -> StoreResult<Vec<BookWithAuthor>> {
        let result = async {
            let mut conn = self.store.reader().await?;
            BookRepository.list(&mut conn).await
        }
        .await;
        logged(result, EntityKind::Book, "list", None)
    }

    pub async fn get_book(&self, id: EntityId) -> StoreResult<BookWithAuthor> {
        let result = async {
            let mut conn = self.store.reader().await?;
            BookRepository
                .find_joined(&mut conn, id)
                .await?
                .ok_or(StoreError::not_found(EntityKind::Book, id))
        }
        .await;
        logged(result, EntityKind::Book, "get", Some(id))
    }

    pub async fn update_book(&self, id: EntityId, fields: &FieldMap) -> StoreResult<BookWithAuthor> {
        let patch = logged(
            BookPatch::from_fields(fields).map_err(StoreError::from),
            EntityKind::Book,
            "update",
            Some(id),
        )?;
        self.mutator.update(&BookRepository, id, &patch).await
    }

    pub async fn delete_book(&self, id: EntityId) -> StoreResult<BookWithAuthor> {
        self.mutator.delete(&BookRepository, id).await
    }
}

fn logged<T>(
    result: StoreResult<T>,
    kind: EntityKind,
    operation: &'static str,
    id: Option<EntityId>,
) -> StoreResult<T> {
    if let Err(err) = &result {
        tracing::warn!(
            entity = %kind,
            id,
            operation,
            failure = err.kind().code(),
            error = %err,
            "catalog operation failed"
        );
    }
    result
}
