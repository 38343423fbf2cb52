//! Book domain types.

use chrono::{DateTime, Utc};

use bramble_core::{BookId, Cents};

/// A catalog book.
#[derive(Debug, Clone)]
pub struct Book {
    /// Unique book ID.
    pub id: BookId,
    /// Title shown in listings.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Cover image URL.
    pub cover: String,
    /// Unit price in minor currency units.
    pub price: Cents,
    /// When the book was created.
    pub created_at: DateTime<Utc>,
    /// When the book was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub cover: String,
    pub price: Cents,
}

/// Partial update for a book; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub price: Option<Cents>,
}
