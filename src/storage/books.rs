use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::model::{Author, Book, BookPatch, BookWithAuthor, EntityId, EntityKind, NewBook};

use super::authors::AuthorRepository;
use super::errors::{StoreError, StoreResult};
use super::Repository;

const SELECT_JOINED: &str = "SELECT b.id, b.title, b.published_date, b.author_id, a.name AS author_name
     FROM books b JOIN authors a ON a.id = b.author_id";

/// One row of the books-authors join
#[derive(sqlx::FromRow)]
struct BookRow {
    id: EntityId,
    title: String,
    published_date: DateTime<Utc>,
    author_id: EntityId,
    author_name: String,
}

impl From<BookRow> for BookWithAuthor {
    fn from(row: BookRow) -> Self {
        Self {
            book: Book {
                id: row.id,
                title: row.title,
                published_date: row.published_date,
                author_id: row.author_id,
            },
            author: Author {
                id: row.author_id,
                name: row.author_name,
            },
        }
    }
}

/// Book persistence
#[derive(Debug, Clone, Copy, Default)]
pub struct BookRepository;

impl BookRepository {
    /// Insert a new book and return it with its author
    ///
    /// The author must exist; run inside a transaction so the check and the
    /// insert see the same state.
    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        input: &NewBook,
    ) -> StoreResult<BookWithAuthor> {
        self.ensure_author(conn, input.author_id).await?;

        let (id,): (EntityId,) = sqlx::query_as(
            "INSERT INTO books (title, published_date, author_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(input.title.as_str())
        .bind(input.published_date)
        .bind(input.author_id)
        .fetch_one(&mut *conn)
        .await?;

        self.find_joined(conn, id)
            .await?
            .ok_or_else(|| StoreError::Internal(format!("book {} missing after insert", id)))
    }

    pub async fn find_joined(
        &self,
        conn: &mut SqliteConnection,
        id: EntityId,
    ) -> StoreResult<Option<BookWithAuthor>> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{} WHERE b.id = ?", SELECT_JOINED))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(BookWithAuthor::from))
    }

    /// Every book with its author, ordered by id
    pub async fn list(&self, conn: &mut SqliteConnection) -> StoreResult<Vec<BookWithAuthor>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!("{} ORDER BY b.id", SELECT_JOINED))
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(BookWithAuthor::from).collect())
    }

    pub(crate) async fn list_plain(&self, conn: &mut SqliteConnection) -> StoreResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, published_date, author_id FROM books ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(books)
    }

    pub async fn list_by_author(
        &self,
        conn: &mut SqliteConnection,
        author_id: EntityId,
    ) -> StoreResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, published_date, author_id FROM books WHERE author_id = ? ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(books)
    }

    async fn ensure_author(&self, conn: &mut SqliteConnection, author_id: EntityId) -> StoreResult<()> {
        if !AuthorRepository.exists(conn, author_id).await? {
            return Err(StoreError::conflict(format!(
                "author {} does not exist",
                author_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for BookRepository {
    type Record = BookWithAuthor;
    type Patch = BookPatch;

    const KIND: EntityKind = EntityKind::Book;

    async fn find_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: EntityId,
    ) -> StoreResult<Option<BookWithAuthor>> {
        self.find_joined(conn, id).await
    }

    async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: EntityId,
        patch: &BookPatch,
    ) -> StoreResult<BookWithAuthor> {
        if let Some(author_id) = patch.author_id {
            self.ensure_author(conn, author_id).await?;
        }

        let result = sqlx::query(
            "UPDATE books SET
                title = COALESCE(?, title),
                published_date = COALESCE(?, published_date),
                author_id = COALESCE(?, author_id)
             WHERE id = ?",
        )
        .bind(patch.title.as_deref())
        .bind(patch.published_date)
        .bind(patch.author_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(EntityKind::Book, id));
        }

        self.find_joined(conn, id)
            .await?
            .ok_or(StoreError::not_found(EntityKind::Book, id))
    }

    async fn delete(&self, conn: &mut SqliteConnection, id: EntityId) -> StoreResult<BookWithAuthor> {
        let book = self
            .find_joined(conn, id)
            .await?
            .ok_or(StoreError::not_found(EntityKind::Book, id))?;

        sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(book)
    }
}
