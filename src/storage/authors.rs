use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::model::{Author, AuthorPatch, AuthorWithBooks, Book, EntityId, EntityKind, NewAuthor};

use super::books::BookRepository;
use super::errors::{StoreError, StoreResult};
use super::Repository;

/// Author persistence
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorRepository;

impl AuthorRepository {
    /// Insert a new author
    pub async fn create(&self, conn: &mut SqliteConnection, input: &NewAuthor) -> StoreResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name) VALUES (?) RETURNING id, name",
        )
        .bind(input.name.as_str())
        .fetch_one(&mut *conn)
        .await?;
        Ok(author)
    }

    pub async fn find(&self, conn: &mut SqliteConnection, id: EntityId) -> StoreResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(author)
    }

    pub async fn exists(&self, conn: &mut SqliteConnection, id: EntityId) -> StoreResult<bool> {
        Ok(self.find(conn, id).await?.is_some())
    }

    /// Read one author with its books
    pub async fn find_with_books(
        &self,
        conn: &mut SqliteConnection,
        id: EntityId,
    ) -> StoreResult<Option<AuthorWithBooks>> {
        let Some(author) = self.find(conn, id).await? else {
            return Ok(None);
        };
        let books = BookRepository.list_by_author(conn, id).await?;
        Ok(Some(AuthorWithBooks { author, books }))
    }

    /// Every author with its books, ordered by id
    pub async fn list_with_books(&self, conn: &mut SqliteConnection) -> StoreResult<Vec<AuthorWithBooks>> {
        let authors = sqlx::query_as::<_, Author>("SELECT id, name FROM authors ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;

        let mut books_by_author: HashMap<EntityId, Vec<Book>> = HashMap::new();
        for book in BookRepository.list_plain(conn).await? {
            books_by_author.entry(book.author_id).or_default().push(book);
        }

        Ok(authors
            .into_iter()
            .map(|author| AuthorWithBooks {
                books: books_by_author.remove(&author.id).unwrap_or_default(),
                author,
            })
            .collect())
    }

    pub async fn count_books(&self, conn: &mut SqliteConnection, id: EntityId) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books WHERE author_id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Repository for AuthorRepository {
    type Record = AuthorWithBooks;
    type Patch = AuthorPatch;

    const KIND: EntityKind = EntityKind::Author;

    async fn find_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: EntityId,
    ) -> StoreResult<Option<AuthorWithBooks>> {
        self.find_with_books(conn, id).await
    }

    /// Rename, then re-read with the author's books on the same connection
    async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: EntityId,
        patch: &AuthorPatch,
    ) -> StoreResult<AuthorWithBooks> {
        let result = sqlx::query("UPDATE authors SET name = COALESCE(?, name) WHERE id = ?")
            .bind(patch.name.as_deref())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(EntityKind::Author, id));
        }

        self.find_with_books(conn, id)
            .await?
            .ok_or(StoreError::not_found(EntityKind::Author, id))
    }

    async fn delete(&self, conn: &mut SqliteConnection, id: EntityId) -> StoreResult<AuthorWithBooks> {
        let books = BookRepository.list_by_author(conn, id).await?;
        let author = sqlx::query_as::<_, Author>("DELETE FROM authors WHERE id = ? RETURNING id, name")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(StoreError::not_found(EntityKind::Author, id))?;
        Ok(AuthorWithBooks { author, books })
    }

    async fn ensure_removable(
        &self,
        conn: &mut SqliteConnection,
        record: &AuthorWithBooks,
    ) -> StoreResult<()> {
        let books = self.count_books(conn, record.author.id).await?;
        if books > 0 {
            return Err(StoreError::conflict(format!(
                "author {} still owns {} book(s); delete them first",
                record.author.id, books
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewBook;
    use crate::storage::Store;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_create_and_find() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.writer().await.unwrap();

        let created = AuthorRepository
            .create(&mut conn, &NewAuthor::new("Octavia Butler"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let found = AuthorRepository.find(&mut conn, 1).await.unwrap();
        assert_eq!(found, Some(created));
        assert!(AuthorRepository.find(&mut conn, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.writer().await.unwrap();

        let patch = AuthorPatch {
            name: Some("x".to_string()),
        };
        let err = AuthorRepository.update(&mut conn, 5, &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 5, .. }));
    }

    #[tokio::test]
    async fn test_update_returns_books() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.writer().await.unwrap();

        let author = AuthorRepository
            .create(&mut conn, &NewAuthor::new("Ursula K. Le Guin"))
            .await
            .unwrap();
        let published = Utc.with_ymd_and_hms(1974, 5, 1, 0, 0, 0).unwrap();
        BookRepository
            .create(&mut conn, &NewBook::new("The Dispossessed", published, author.id))
            .await
            .unwrap();

        let patch = AuthorPatch {
            name: Some("U. K. Le Guin".to_string()),
        };
        let updated = AuthorRepository.update(&mut conn, author.id, &patch).await.unwrap();
        assert_eq!(updated.author.name, "U. K. Le Guin");
        assert_eq!(updated.books.len(), 1);
        assert_eq!(updated.books[0].title, "The Dispossessed");
    }

    #[tokio::test]
    async fn test_list_with_books_empty() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.reader().await.unwrap();
        assert!(AuthorRepository.list_with_books(&mut conn).await.unwrap().is_empty());
    }
}
