//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter},
        page::{Page, PageRequest},
    },
    repository::{
        books::{BOOK_HAS_LOANS, DUPLICATE_ISBN},
        Repository,
    },
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a new book; the ISBN must not be registered yet
    pub async fn create(&self, book: Book) -> AppResult<Book> {
        if self.repository.books.exists_by_isbn(&book.isbn).await? {
            tracing::warn!("Rejected book with duplicate isbn {}", book.isbn);
            return Err(AppError::BusinessRule(DUPLICATE_ISBN.to_string()));
        }
        self.repository.books.insert(&book).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        self.repository.books.find_by_id(id).await
    }

    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.repository.books.find_by_isbn(isbn).await
    }

    /// Persist title and author of an existing book
    pub async fn update(&self, book: Book) -> AppResult<Book> {
        let id = require_id(&book)?;
        self.repository.books.update(id, &book).await
    }

    /// Delete a book that has never been loaned
    pub async fn delete(&self, book: &Book) -> AppResult<()> {
        let id = require_id(book)?;
        if self.repository.loans.exists_by_book(id).await? {
            tracing::warn!("Rejected delete of book {} with loans", book.isbn);
            return Err(AppError::BusinessRule(BOOK_HAS_LOANS.to_string()));
        }
        self.repository.books.delete(id).await
    }

    /// Search books, matching non-empty filter fields case-insensitively
    pub async fn find(&self, filter: &BookFilter, page: PageRequest) -> AppResult<Page<Book>> {
        self.repository.books.find_all(filter, page).await
    }
}

fn require_id(book: &Book) -> AppResult<i32> {
    book.id
        .ok_or_else(|| AppError::InvalidArgument("book id cant be null.".to_string()))
}
