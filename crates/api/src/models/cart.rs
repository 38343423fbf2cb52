//! The cart value type.
//!
//! A cart is an ordered sequence of book IDs with set semantics: insertion
//! order is preserved for display, but a book is either in the cart once or
//! not at all. Serialized form is a bare JSON array (`[7,9]`), which is both
//! what the expiring store holds and what the API returns.

use serde::{Deserialize, Serialize};

use bramble_core::BookId;

/// An ordered, duplicate-free collection of book IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<BookId>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append `book` unless it is already present.
    ///
    /// Returns whether the cart changed; adding a book twice is a no-op.
    pub fn insert(&mut self, book: BookId) -> bool {
        if self.contains(book) {
            return false;
        }
        self.items.push(book);
        true
    }

    /// Remove `book`, preserving the relative order of the rest.
    ///
    /// Returns whether the cart changed; removing an absent book is a no-op.
    pub fn remove(&mut self, book: BookId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| *item != book);
        self.items.len() != before
    }

    /// Whether `book` is in the cart.
    #[must_use]
    pub fn contains(&self, book: BookId) -> bool {
        self.items.contains(&book)
    }

    /// Number of books in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart holds no books.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the books in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = BookId> + '_ {
        self.items.iter().copied()
    }

    /// The books in insertion order.
    #[must_use]
    pub fn items(&self) -> &[BookId] {
        &self.items
    }
}

impl FromIterator<BookId> for Cart {
    fn from_iter<I: IntoIterator<Item = BookId>>(iter: I) -> Self {
        let mut cart = Self::new();
        for book in iter {
            cart.insert(book);
        }
        cart
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn book(id: i32) -> BookId {
        BookId::new(id)
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut cart = Cart::new();
        assert!(cart.insert(book(7)));
        assert!(cart.insert(book(9)));
        assert!(cart.insert(book(3)));
        assert_eq!(cart.items(), &[book(7), book(9), book(3)]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut cart = Cart::new();
        cart.insert(book(7));
        cart.insert(book(9));
        assert!(!cart.insert(book(7)));
        assert_eq!(cart.items(), &[book(7), book(9)]);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut cart: Cart = [book(1), book(2), book(3)].into_iter().collect();
        assert!(cart.remove(book(2)));
        assert_eq!(cart.items(), &[book(1), book(3)]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart: Cart = [book(1)].into_iter().collect();
        assert!(!cart.remove(book(99)));
        assert_eq!(cart.items(), &[book(1)]);
    }

    #[test]
    fn test_serializes_as_bare_array() {
        let cart: Cart = [book(7), book(9)].into_iter().collect();
        assert_eq!(serde_json::to_string(&cart).unwrap(), "[7,9]");

        let back: Cart = serde_json::from_str("[7,9]").unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_deduplicates_from_iterator() {
        let cart: Cart = [book(7), book(9), book(7)].into_iter().collect();
        assert_eq!(cart.items(), &[book(7), book(9)]);
    }
}
