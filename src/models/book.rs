//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database.
///
/// `id` is `None` until the book has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Option<i32>,
    pub isbn: String,
    pub title: String,
    pub author: String,
}

impl Book {
    pub fn new(isbn: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: None,
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
        }
    }
}

/// Book transfer object, used both as request body and response
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookDto {
    /// Generated identifier (ignored on input)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, message = "isbn must not be empty"))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "author must not be empty"))]
    pub author: String,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
        }
    }
}

impl From<BookDto> for Book {
    fn from(dto: BookDto) -> Self {
        Book::new(dto.isbn, dto.title, dto.author)
    }
}

/// Book search filter. Empty fields are ignored; the others are matched
/// as case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookFilter {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl BookFilter {
    pub fn isbn(&self) -> Option<&str> {
        non_empty(&self.isbn)
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(&self.title)
    }

    pub fn author(&self) -> Option<&str> {
        non_empty(&self.author)
    }

    /// Check a book against this filter (same semantics as the SQL search)
    pub fn matches(&self, book: &Book) -> bool {
        contains_ignore_case(&book.isbn, self.isbn())
            && contains_ignore_case(&book.title, self.title())
            && contains_ignore_case(&book.author, self.author())
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(value: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dto_reports_every_field() {
        let errors = BookDto::default().validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 3);
    }

    #[test]
    fn test_filter_ignores_blank_fields() {
        let filter = BookFilter {
            isbn: Some("  ".to_string()),
            title: Some("bourne".to_string()),
            author: None,
        };
        assert_eq!(filter.isbn(), None);
        assert!(filter.matches(&Book::new("123", "A Identidade Bourne", "Robert Ludlum")));
        assert!(!filter.matches(&Book::new("123", "Dune", "Frank Herbert")));
    }
}
