//! Book catalog route handlers.
//!
//! Prices cross this boundary in major units (`19.99`) and are converted to
//! integer cents on the way in; everything below this layer works in cents.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bramble_core::{BookId, Cents};

use crate::db::books::BookRepository;
use crate::error::{ApiError, Result};
use crate::middleware::RequireAuth;
use crate::models::Book;
use crate::models::book::{BookPatch, NewBook};
use crate::state::AppState;

/// Book creation request body.
#[derive(Debug, Deserialize)]
pub struct SaveBookRequest {
    pub title: String,
    pub description: String,
    pub cover: String,
    /// Price in major units, e.g. `"19.99"`.
    pub price: Decimal,
}

/// Partial book update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub price: Option<Decimal>,
}

/// Book response body.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: BookId,
    pub title: String,
    pub description: String,
    pub cover: String,
    /// Price in major units.
    pub price: Decimal,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            description: book.description,
            cover: book.cover,
            price: book.price.to_major(),
        }
    }
}

fn price_to_cents(price: Decimal) -> Result<Cents> {
    Cents::from_major(price).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// List the catalog.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<BookResponse>>> {
    let books = BookRepository::new(state.pool()).list().await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// Fetch one book.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BookResponse>> {
    let book = BookRepository::new(state.pool())
        .get(BookId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {id}")))?;

    Ok(Json(book.into()))
}

/// Create a book.
#[instrument(skip(state, user, body))]
pub async fn create(
    State(state): State<AppState>,
    user: RequireAuth,
    Json(body): Json<SaveBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>)> {
    let RequireAuth(_user) = user;

    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }

    let new_book = NewBook {
        title: body.title,
        description: body.description,
        cover: body.cover,
        price: price_to_cents(body.price)?,
    };

    let book = BookRepository::new(state.pool()).create(&new_book).await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Partially update a book.
#[instrument(skip(state, user, body))]
pub async fn update(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(id): Path<i32>,
    Json(body): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>> {
    let RequireAuth(_user) = user;

    let patch = BookPatch {
        title: body.title,
        description: body.description,
        cover: body.cover,
        price: body.price.map(price_to_cents).transpose()?,
    };

    let book = BookRepository::new(state.pool())
        .update(BookId::new(id), &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {id}")))?;

    Ok(Json(book.into()))
}

/// Delete a book.
///
/// Carts referencing the book are left alone; the total computation skips
/// entries that no longer resolve.
#[instrument(skip(state, user))]
pub async fn destroy(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let RequireAuth(_user) = user;

    let deleted = BookRepository::new(state.pool())
        .delete(BookId::new(id))
        .await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("book {id}")))
    }
}
