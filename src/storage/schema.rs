//! Schema bootstrap
//!
//! Idempotent `CREATE ... IF NOT EXISTS` statements run at startup. There is
//! no migration history; the tables below are the whole schema.

use sqlx::SqliteConnection;

use super::errors::StoreResult;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )",
    // Deleting an author that still owns books is rejected, never cascaded.
    "CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        published_date TEXT NOT NULL,
        author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE RESTRICT
    )",
    "CREATE INDEX IF NOT EXISTS books_author_id ON books(author_id)",
];

/// Create any missing tables and indexes
pub async fn ensure_schema(conn: &mut SqliteConnection) -> StoreResult<()> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "schema ensured");
    Ok(())
}
