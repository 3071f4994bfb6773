//! Book collection service

use chrono::Utc;
use rand::Rng;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookPayload, BookQuery, BookShort},
    repository::Repository,
};

/// Alphabet used for book ids (URL-safe, same set as nanoid)
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
pub const ID_LENGTH: usize = 16;

/// Generate a random book id
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Check the two payload rules and return the book name.
/// `action` is the verb used in messages ("add", "update").
fn validate_payload(payload: &BookPayload, action: &str) -> AppResult<String> {
    let name = match payload.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(AppError::Validation(format!(
                "Failed to {} book. Please provide the book name",
                action
            )))
        }
    };

    if payload.read_page() > payload.page_count() {
        return Err(AppError::Validation(format!(
            "Failed to {} book. readPage cannot be greater than pageCount",
            action
        )));
    }

    Ok(name)
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Validate and store a new book, returning its id
    pub async fn create_book(&self, payload: BookPayload) -> AppResult<String> {
        let name = validate_payload(&payload, "add")?;

        let mut book = Book::new(generate_id(), name, payload, Utc::now());
        while !self.repository.books.insert(book.clone()).await {
            tracing::debug!("Book id collision on {}, regenerating", book.id);
            book.id = generate_id();
        }

        if !self.repository.books.exists(&book.id).await {
            return Err(AppError::Internal("Failed to add book".to_string()));
        }

        tracing::info!("Book created: id={} name={:?}", book.id, book.name);
        Ok(book.id)
    }

    /// List books matching the query filters, in insertion order
    pub async fn list_books(&self, query: &BookQuery) -> Vec<BookShort> {
        let filter = query.filter();
        let books = self.repository.books.list(&filter).await;
        tracing::debug!("Listed {} books with {:?}", books.len(), filter);
        books
    }

    /// Number of books currently stored
    pub async fn count_books(&self) -> usize {
        self.repository.books.count().await
    }

    /// Get a book by ID with full details
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository
            .books
            .get_by_id(id)
            .await
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Replace every mutable field of an existing book
    pub async fn update_book(&self, id: &str, payload: BookPayload) -> AppResult<()> {
        let name = validate_payload(&payload, "update")?;
        let now = Utc::now();

        let updated = self
            .repository
            .books
            .update(id, |book| book.apply(name, payload, now))
            .await;
        if !updated {
            return Err(AppError::NotFound(
                "Failed to update book. Id not found".to_string(),
            ));
        }

        tracing::info!("Book updated: id={}", id);
        Ok(())
    }

    /// Delete a book
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        if !self.repository.books.delete(id).await {
            return Err(AppError::NotFound(
                "Failed to delete book. Id not found".to_string(),
            ));
        }

        tracing::info!("Book deleted: id={}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> BooksService {
        BooksService::new(Repository::new())
    }

    fn payload(name: &str, page_count: u32, read_page: u32) -> BookPayload {
        BookPayload {
            name: Some(name.to_string()),
            year: Some(json!(1965)),
            author: Some(json!("Frank Herbert")),
            summary: Some(json!("Spice")),
            publisher: Some(json!("Chilton")),
            page_count: Some(page_count),
            read_page: Some(read_page),
            reading: None,
        }
    }

    #[test]
    fn test_generate_id() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.bytes().all(|c| ID_ALPHABET.contains(&c)));
        assert_ne!(generate_id(), generate_id());
    }

    #[tokio::test]
    async fn test_create_rejects_missing_or_empty_name() {
        let service = service();

        let missing = BookPayload::default();
        let err = service.create_book(missing).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("book name")));

        let empty = payload("", 10, 0);
        assert!(matches!(
            service.create_book(empty).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(service.repository.books.count().await, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_read_page_over_page_count() {
        let service = service();
        let err = service.create_book(payload("Dune", 10, 11)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("readPage")));
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = service();
        let id = service.create_book(payload("Dune", 100, 100)).await.unwrap();

        let book = service.get_book(&id).await.unwrap();
        assert_eq!(book.id, id);
        assert_eq!(book.name, "Dune");
        assert_eq!(book.year, Some(json!(1965)));
        assert_eq!(book.author, Some(json!("Frank Herbert")));
        assert_eq!(book.page_count, 100);
        assert!(book.finished);
        assert_eq!(book.inserted_at, book.updated_at);
    }

    #[tokio::test]
    async fn test_update() {
        let service = service();
        let id = service.create_book(payload("Dune", 100, 100)).await.unwrap();
        let before = service.get_book(&id).await.unwrap();

        service
            .update_book(&id, payload("Dune Messiah", 200, 20))
            .await
            .unwrap();

        let after = service.get_book(&id).await.unwrap();
        assert_eq!(after.name, "Dune Messiah");
        assert!(!after.finished);
        assert_eq!(after.inserted_at, before.inserted_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_leaves_store_unchanged() {
        let service = service();
        let id = service.create_book(payload("Dune", 100, 10)).await.unwrap();
        let before = service.get_book(&id).await.unwrap();

        let err = service
            .update_book("missing", payload("Other", 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(service.get_book(&id).await.unwrap(), before);
        assert_eq!(service.repository.books.count().await, 1);
    }

    #[tokio::test]
    async fn test_update_validates_before_lookup() {
        let service = service();
        let err = service
            .update_book("missing", payload("", 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Failed to update")));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        let id = service.create_book(payload("Dune", 100, 10)).await.unwrap();

        service.delete_book(&id).await.unwrap();
        assert!(matches!(
            service.get_book(&id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_book(&id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let service = service();
        service.create_book(payload("Dune", 100, 100)).await.unwrap();
        service
            .create_book(BookPayload {
                reading: Some(true),
                ..payload("Children of Dune", 300, 5)
            })
            .await
            .unwrap();
        service.create_book(payload("Neuromancer", 250, 0)).await.unwrap();

        let all = service.list_books(&BookQuery::default()).await;
        let names: Vec<&str> = all.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Dune", "Children of Dune", "Neuromancer"]);

        let dune = service
            .list_books(&BookQuery {
                name: Some("DUNE".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(dune.len(), 2);

        let finished = service
            .list_books(&BookQuery {
                finished: Some("1".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].name, "Dune");

        let reading_dune = service
            .list_books(&BookQuery {
                name: Some("dune".to_string()),
                reading: Some("1".to_string()),
                finished: None,
            })
            .await;
        assert_eq!(reading_dune.len(), 1);
        assert_eq!(reading_dune[0].name, "Children of Dune");

        let not_reading = service
            .list_books(&BookQuery {
                reading: Some("0".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(not_reading.len(), 2);
    }
}
