//! Book model and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Full book record as stored and returned by `GET /books/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub name: String,
    #[schema(value_type = Object)]
    pub year: Option<Value>,
    #[schema(value_type = Object)]
    pub author: Option<Value>,
    #[schema(value_type = Object)]
    pub summary: Option<Value>,
    #[schema(value_type = Object)]
    pub publisher: Option<Value>,
    pub page_count: u32,
    pub read_page: u32,
    /// Derived: `page_count == read_page`
    pub finished: bool,
    pub reading: bool,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Build a new record from a validated payload. Both timestamps are set to `now`.
    pub fn new(id: String, name: String, payload: BookPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            page_count: payload.page_count(),
            read_page: payload.read_page(),
            finished: payload.is_finished(),
            reading: payload.reading.unwrap_or_default(),
            year: payload.year,
            author: payload.author,
            summary: payload.summary,
            publisher: payload.publisher,
            inserted_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field. `id` and `inserted_at` are left untouched.
    pub fn apply(&mut self, name: String, payload: BookPayload, now: DateTime<Utc>) {
        self.name = name;
        self.page_count = payload.page_count();
        self.read_page = payload.read_page();
        self.finished = payload.is_finished();
        self.reading = payload.reading.unwrap_or_default();
        self.year = payload.year;
        self.author = payload.author;
        self.summary = payload.summary;
        self.publisher = payload.publisher;
        self.updated_at = now;
    }
}

/// Request body for create and update.
///
/// `year`, `author`, `summary` and `publisher` accept any JSON value and are
/// stored as given. Missing or `null` numbers and flags fall back to `0`/`false`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    /// Required, must not be empty
    pub name: Option<String>,
    #[schema(value_type = Object)]
    pub year: Option<Value>,
    #[schema(value_type = Object)]
    pub author: Option<Value>,
    #[schema(value_type = Object)]
    pub summary: Option<Value>,
    #[schema(value_type = Object)]
    pub publisher: Option<Value>,
    pub page_count: Option<u32>,
    /// Must not exceed `pageCount`
    pub read_page: Option<u32>,
    pub reading: Option<bool>,
}

impl BookPayload {
    pub fn page_count(&self) -> u32 {
        self.page_count.unwrap_or_default()
    }

    pub fn read_page(&self) -> u32 {
        self.read_page.unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.page_count() == self.read_page()
    }
}

/// Short book representation for lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: String,
    pub name: String,
    #[schema(value_type = Object)]
    pub publisher: Option<Value>,
}

impl From<&Book> for BookShort {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            publisher: book.publisher.clone(),
        }
    }
}

/// Book list query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive substring of the book name
    pub name: Option<String>,
    /// `1` for books being read, any other value for the rest
    pub reading: Option<String>,
    /// `1` for finished books, any other value for the rest
    pub finished: Option<String>,
}

/// Builds a query from raw `(key, value)` pairs. Repeated keys keep their
/// first value and unknown keys are ignored.
impl FromIterator<(String, String)> for BookQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = BookQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut query.name,
                "reading" => &mut query.reading,
                "finished" => &mut query.finished,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

impl BookQuery {
    /// Compile the raw query into a predicate.
    pub fn filter(&self) -> BookFilter {
        BookFilter {
            name: self
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .map(str::to_lowercase),
            reading: self.reading.as_deref().map(|v| v == "1"),
            finished: self.finished.as_deref().map(|v| v == "1"),
        }
    }
}

/// Parsed list filters; every `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub name: Option<String>,
    pub reading: Option<bool>,
    pub finished: Option<bool>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(ref needle) = self.name {
            if !book.name.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(reading) = self.reading {
            if book.reading != reading {
                return false;
            }
        }
        if let Some(finished) = self.finished {
            if book.finished != finished {
                return false;
            }
        }
        true
    }
}
