//! In-memory book storage

use std::sync::Arc;

use indexmap::{map::Entry, IndexMap};
use tokio::sync::RwLock;

use crate::models::book::{Book, BookFilter, BookShort};

/// Insertion-ordered map of books keyed by id.
#[derive(Clone, Default)]
pub struct BooksRepository {
    books: Arc<RwLock<IndexMap<String, Book>>>,
}

impl BooksRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// List books matching the filter, projected to their short form.
    pub async fn list(&self, filter: &BookFilter) -> Vec<BookShort> {
        let books = self.books.read().await;
        books
            .values()
            .filter(|book| filter.matches(book))
            .map(BookShort::from)
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Book> {
        self.books.read().await.get(id).cloned()
    }

    pub async fn exists(&self, id: &str) -> bool {
        self.books.read().await.contains_key(id)
    }

    /// Append a book. Returns `false` and leaves the store untouched if the id is taken.
    pub async fn insert(&self, book: Book) -> bool {
        let mut books = self.books.write().await;
        match books.entry(book.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(book);
                true
            }
        }
    }

    /// Mutate a book in place under the write lock. Returns `false` if the id is unknown.
    pub async fn update<F>(&self, id: &str, modify: F) -> bool
    where
        F: FnOnce(&mut Book),
    {
        let mut books = self.books.write().await;
        match books.get_mut(id) {
            Some(book) => {
                modify(book);
                true
            }
            None => false,
        }
    }

    /// Remove a book, keeping the order of the remaining ones.
    pub async fn delete(&self, id: &str) -> bool {
        self.books.write().await.shift_remove(id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.books.read().await.len()
    }
}
