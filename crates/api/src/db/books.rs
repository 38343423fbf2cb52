//! Book repository for catalog database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bramble_core::{BookId, Cents};

use super::RepositoryError;
use crate::models::Book;
use crate::models::book::{BookPatch, NewBook};

/// Database row for a book.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i32,
    title: String,
    description: String,
    cover: String,
    price_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: BookId::new(row.id),
            title: row.title,
            description: row.description,
            cover: row.cover,
            price: Cents::new(row.price_cents),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for book database operations.
pub struct BookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch every book in the catalog, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        let rows: Vec<BookRow> = sqlx::query_as(
            "SELECT id, title, description, cover, price_cents, created_at, updated_at
             FROM book
             ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    /// Fetch a book by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row: Option<BookRow> = sqlx::query_as(
            "SELECT id, title, description, cover, price_cents, created_at, updated_at
             FROM book
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    /// Fetch just a book's unit price.
    ///
    /// `Ok(None)` means the book does not exist (any more).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn price(&self, id: BookId) -> Result<Option<Cents>, RepositoryError> {
        let price: Option<(i64,)> = sqlx::query_as("SELECT price_cents FROM book WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(price.map(|(cents,)| Cents::new(cents)))
    }

    /// Insert a new book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, book: &NewBook) -> Result<Book, RepositoryError> {
        let row: BookRow = sqlx::query_as(
            "INSERT INTO book (title, description, cover, price_cents)
             VALUES ($1, $2, $3, $4)
             RETURNING id, title, description, cover, price_cents, created_at, updated_at",
        )
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.cover)
        .bind(book.price.as_i64())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update; absent fields keep their current value.
    ///
    /// Returns `Ok(None)` if the book does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: BookId,
        patch: &BookPatch,
    ) -> Result<Option<Book>, RepositoryError> {
        let row: Option<BookRow> = sqlx::query_as(
            "UPDATE book
             SET title       = COALESCE($2, title),
                 description = COALESCE($3, description),
                 cover       = COALESCE($4, cover),
                 price_cents = COALESCE($5, price_cents),
                 updated_at  = now()
             WHERE id = $1
             RETURNING id, title, description, cover, price_cents, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.cover.as_deref())
        .bind(patch.price.map(Cents::as_i64))
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    /// Delete a book; returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: BookId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM book WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
