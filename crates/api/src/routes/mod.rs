//! HTTP route handlers for the bookshop API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (verifies database)
//!
//! # Books
//! GET    /api/books             - List the catalog
//! POST   /api/books             - Create a book (auth)
//! GET    /api/books/{id}        - Fetch one book
//! PATCH  /api/books/{id}        - Partially update a book (auth)
//! DELETE /api/books/{id}        - Delete a book (auth)
//!
//! # Cart (auth; per-user, expiring)
//! GET    /api/cart              - Read the cart
//! DELETE /api/cart              - Clear the cart
//! GET    /api/cart/total        - Total in minor and major units
//! POST   /api/cart/{book_id}    - Add a book
//! DELETE /api/cart/{book_id}    - Remove a book
//!
//! # Auth
//! POST /api/auth/register       - Register and log in
//! POST /api/auth/login          - Log in
//! POST /api/auth/logout         - Log out
//!
//! # Payment
//! POST /api/payment/checkout    - Create a Stripe checkout session (auth)
//! GET  /api/payment/success     - Checkout success landing
//! GET  /api/payment/cancel      - Checkout cancel landing
//! ```

pub mod auth;
pub mod books;
pub mod cart;
pub mod payment;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the book routes router.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::index).post(books::create))
        .route(
            "/{id}",
            get(books::show).patch(books::update).delete(books::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/total", get(cart::total))
        .route("/{book_id}", post(cart::add).delete(cart::remove))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(payment::checkout))
        .route("/success", get(payment::success))
        .route("/cancel", get(payment::cancel))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/books", book_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/payment", payment_routes())
}
