//! Existence-checked mutation invariants
//!
//! - An update is applied only to an entity that exists when it commits
//! - A missing identifier yields NotFound and writes nothing
//! - Deleting an author that still owns books is rejected
//! - Invalid input never reaches storage
//! - A mutation dropped mid-flight leaves the old or the new state, and frees the writer

use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use shelf::catalog::Catalog;
use shelf::model::{EntityKind, FieldError, FieldMap, NewAuthor, NewBook};
use shelf::storage::{DatabaseConfig, ErrorKind, Store, StoreError};

async fn catalog() -> Catalog {
    Catalog::new(Store::in_memory().await.unwrap())
}

async fn file_catalog(dir: &TempDir, name: &str) -> Catalog {
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join(name).display()),
        ..Default::default()
    };
    let store = Store::connect(&config).await.unwrap();
    store.ensure_schema().await.unwrap();
    Catalog::new(store)
}

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

async fn seed(catalog: &Catalog) -> (i64, i64) {
    let author = catalog.create_author(NewAuthor::new("A")).await.unwrap();
    let published = Utc.with_ymd_and_hms(2001, 9, 1, 0, 0, 0).unwrap();
    let book = catalog
        .create_book(NewBook::new("B", published, author.id))
        .await
        .unwrap();
    (author.id, book.book.id)
}

#[tokio::test]
async fn update_is_visible_to_later_reads() {
    let catalog = catalog().await;
    let (_, book_id) = seed(&catalog).await;

    let updated = catalog
        .update_book(book_id, &fields(json!({"title": "Renamed"})))
        .await
        .unwrap();
    assert_eq!(updated.book.title, "Renamed");

    let read = catalog.get_book(book_id).await.unwrap();
    assert_eq!(read, updated);
}

#[tokio::test]
async fn update_of_missing_id_writes_nothing() {
    let catalog = catalog().await;
    let (_, book_id) = seed(&catalog).await;
    let before = catalog.list_books().await.unwrap();

    let err = catalog
        .update_book(999, &fields(json!({"title": "Ghost"})))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::NotFound {
            kind: EntityKind::Book,
            id: 999
        }
    ));
    assert_eq!(catalog.list_books().await.unwrap(), before);
    assert_eq!(catalog.get_book(book_id).await.unwrap().book.title, "B");
}

#[tokio::test]
async fn update_after_delete_is_not_found() {
    let catalog = catalog().await;
    let (_, book_id) = seed(&catalog).await;

    catalog.delete_book(book_id).await.unwrap();
    let err = catalog
        .update_book(book_id, &fields(json!({"title": "Back"})))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(catalog.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_delete_and_update_never_resurrect() {
    let dir = TempDir::new().unwrap();
    let catalog = file_catalog(&dir, "race.db").await;

    for _ in 0..10 {
        let (_, book_id) = seed(&catalog).await;
        let patch = fields(json!({"title": "Late"}));

        let (deleted, updated) = tokio::join!(
            catalog.delete_book(book_id),
            catalog.update_book(book_id, &patch)
        );

        deleted.unwrap();
        match updated {
            Ok(book) => assert_eq!(book.book.title, "Late"),
            Err(err) => assert_eq!(err.kind(), ErrorKind::NotFound),
        }
        assert_eq!(
            catalog.get_book(book_id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}

#[tokio::test]
async fn different_ids_proceed_independently() {
    let catalog = catalog().await;
    let first = catalog.create_author(NewAuthor::new("First")).await.unwrap();
    let second = catalog.create_author(NewAuthor::new("Second")).await.unwrap();

    let one = fields(json!({"name": "One"}));
    let two = fields(json!({"name": "Two"}));
    let (a, b) = tokio::join!(
        catalog.update_author(first.id, &one),
        catalog.update_author(second.id, &two)
    );

    assert_eq!(a.unwrap().author.name, "One");
    assert_eq!(b.unwrap().author.name, "Two");
}

#[tokio::test]
async fn updating_an_author_returns_their_books() {
    let catalog = catalog().await;
    let (author_id, book_id) = seed(&catalog).await;

    let updated = catalog
        .update_author(author_id, &fields(json!({"name": "Renamed"})))
        .await
        .unwrap();

    assert_eq!(updated.author.name, "Renamed");
    assert_eq!(updated.books.len(), 1);
    assert_eq!(updated.books[0].id, book_id);
    assert_eq!(updated.books[0].title, "B");
}

#[tokio::test]
async fn cancelled_update_leaves_no_partial_write() {
    let dir = TempDir::new().unwrap();
    let catalog = file_catalog(&dir, "cancel.db").await;
    let (author_id, book_id) = seed(&catalog).await;

    for n in 0..40 {
        let before = catalog.get_author(author_id).await.unwrap().author.name;
        let next = format!("Author {}", n);

        let task = {
            let catalog = catalog.clone();
            let patch = fields(json!({"name": next.clone()}));
            tokio::spawn(async move { catalog.update_author(author_id, &patch).await })
        };
        for _ in 0..n {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;

        let after = catalog.get_author(author_id).await.unwrap().author.name;
        assert!(after == before || after == next, "round {}: {:?}", n, after);

        let title = format!("Title {}", n);
        let book = tokio::time::timeout(
            Duration::from_secs(5),
            catalog.update_book(book_id, &fields(json!({"title": title.clone()}))),
        )
        .await
        .expect("writer still held after cancellation")
        .unwrap();
        assert_eq!(book.book.title, title);
    }
}

#[tokio::test]
async fn repeating_an_update_is_idempotent() {
    let catalog = catalog().await;
    let (author_id, _) = seed(&catalog).await;
    let patch = fields(json!({"name": "Same"}));

    let once = catalog.update_author(author_id, &patch).await.unwrap();
    let twice = catalog.update_author(author_id, &patch).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(catalog.get_author(author_id).await.unwrap(), once);
}

#[tokio::test]
async fn author_book_lifecycle() {
    let catalog = catalog().await;

    let author = catalog.create_author(NewAuthor::new("A")).await.unwrap();
    assert_eq!(author.id, 1);

    let published = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let book = catalog
        .create_book(NewBook::new("B", published, 1))
        .await
        .unwrap();
    assert_eq!(book.book.id, 1);
    assert_eq!(book.author, author);

    let updated = catalog
        .update_book(1, &fields(json!({"title": "C"})))
        .await
        .unwrap();
    assert_eq!(updated.book.title, "C");
    assert_eq!(updated.book.author_id, 1);

    let err = catalog.delete_author(1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let still_there = catalog.get_book(1).await.unwrap();
    assert_eq!(still_there.book.title, "C");
    assert_eq!(catalog.get_author(1).await.unwrap().books.len(), 1);

    catalog.delete_book(1).await.unwrap();
    let removed = catalog.delete_author(1).await.unwrap();
    assert_eq!(removed.author, author);
    assert!(removed.books.is_empty());
    assert!(catalog.list_authors().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_patches_are_rejected_without_writing() {
    let catalog = catalog().await;
    let (_, book_id) = seed(&catalog).await;
    let before = catalog.get_book(book_id).await.unwrap();

    let cases = [
        (json!({}), FieldError::Empty),
        (json!({"id": 5}), FieldError::ImmutableField("id".to_string())),
        (json!({"isbn": "x"}), FieldError::UnknownField("isbn".to_string())),
    ];
    for (body, expected) in cases {
        let err = catalog.update_book(book_id, &fields(body)).await.unwrap_err();
        assert!(
            matches!(&err, StoreError::Validation(found) if *found == expected),
            "{:?}",
            err
        );
    }

    let err = catalog
        .update_book(book_id, &fields(json!({"title": 42})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = catalog
        .update_book(book_id, &fields(json!({"publishedDate": "last spring"})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(catalog.get_book(book_id).await.unwrap(), before);
}

#[tokio::test]
async fn moving_a_book_to_a_missing_author_conflicts() {
    let catalog = catalog().await;
    let (author_id, book_id) = seed(&catalog).await;

    let err = catalog
        .update_book(book_id, &fields(json!({"authorId": 77, "title": "Moved"})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let book = catalog.get_book(book_id).await.unwrap();
    assert_eq!(book.book.author_id, author_id);
    assert_eq!(book.book.title, "B");
}

#[tokio::test]
async fn moving_a_book_between_authors() {
    let catalog = catalog().await;
    let (from, book_id) = seed(&catalog).await;
    let to = catalog.create_author(NewAuthor::new("Z")).await.unwrap();

    let moved = catalog
        .update_book(book_id, &fields(json!({"authorId": to.id, "publishedDate": "2010-05-04"})))
        .await
        .unwrap();

    assert_eq!(moved.author, to);
    assert_eq!(
        moved.book.published_date,
        Utc.with_ymd_and_hms(2010, 5, 4, 0, 0, 0).unwrap()
    );
    assert!(catalog.get_author(from).await.unwrap().books.is_empty());
    assert_eq!(catalog.get_author(to.id).await.unwrap().books.len(), 1);
}
