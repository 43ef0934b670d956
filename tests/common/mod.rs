//! In-memory stores and request helpers for router tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;

use library_api::{
    api::create_router,
    config::AppConfig,
    error::{AppError, AppResult},
    models::{Book, BookFilter, CreateLoan, Loan, LoanFilter, Page, PageRequest},
    repository::{BooksRepository, LoansRepository, Repository},
    services::Services,
    AppState,
};

fn paginate<T: Clone>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as i64;
    let content = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .collect();
    Page::new(content, page, total)
}

#[derive(Default)]
pub struct InMemoryBooks {
    books: Mutex<Vec<Book>>,
}

#[async_trait]
impl BooksRepository for InMemoryBooks {
    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        Ok(self.books.lock().unwrap().iter().any(|b| b.isbn == isbn))
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        Ok(self.books.lock().unwrap().iter().find(|b| b.isbn == isbn).cloned())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.books.lock().unwrap().iter().find(|b| b.id == Some(id)).cloned())
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut books = self.books.lock().unwrap();
        let saved = Book {
            id: Some(books.len() as i32 + 1),
            ..book.clone()
        };
        books.push(saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: i32, book: &Book) -> AppResult<Book> {
        let mut books = self.books.lock().unwrap();
        let stored = books
            .iter_mut()
            .find(|b| b.id == Some(id))
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        stored.title = book.title.clone();
        stored.author = book.author.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.books.lock().unwrap().retain(|b| b.id != Some(id));
        Ok(())
    }

    async fn find_all(&self, filter: &BookFilter, page: PageRequest) -> AppResult<Page<Book>> {
        let matches: Vec<Book> = self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        Ok(paginate(matches, page))
    }
}

#[derive(Default)]
pub struct InMemoryLoans {
    loans: Mutex<Vec<Loan>>,
}

#[async_trait]
impl LoansRepository for InMemoryLoans {
    async fn exists_unreturned_by_book(&self, book_id: i32, except: Option<i32>) -> AppResult<bool> {
        Ok(self
            .loans
            .lock()
            .unwrap()
            .iter()
            .filter(|l| except.is_none() || l.id != except)
            .any(|l| l.book.id == Some(book_id) && l.is_unresolved()))
    }

    async fn exists_by_book(&self, book_id: i32) -> AppResult<bool> {
        Ok(self.loans.lock().unwrap().iter().any(|l| l.book.id == Some(book_id)))
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        Ok(self.loans.lock().unwrap().iter().find(|l| l.id == Some(id)).cloned())
    }

    async fn insert(&self, loan: &CreateLoan, loan_date: NaiveDate) -> AppResult<Loan> {
        let mut loans = self.loans.lock().unwrap();
        let saved = Loan {
            id: Some(loans.len() as i32 + 1),
            book: loan.book.clone(),
            customer: loan.customer.clone(),
            customer_email: loan.customer_email.clone(),
            loan_date,
            returned: None,
        };
        loans.push(saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: i32, loan: &Loan) -> AppResult<Loan> {
        let mut loans = self.loans.lock().unwrap();
        let stored = loans
            .iter_mut()
            .find(|l| l.id == Some(id))
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;
        stored.returned = loan.returned;
        Ok(stored.clone())
    }

    async fn find_by_isbn_or_customer(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<Page<Loan>> {
        let matches: Vec<Loan> = self
            .loans
            .lock()
            .unwrap()
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        Ok(paginate(matches, page))
    }

    async fn find_by_book(&self, book_id: i32, page: PageRequest) -> AppResult<Page<Loan>> {
        let matches: Vec<Loan> = self
            .loans
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.book.id == Some(book_id))
            .cloned()
            .collect();
        Ok(paginate(matches, page))
    }

    async fn find_late(&self, cutoff: NaiveDate) -> AppResult<Vec<Loan>> {
        Ok(self
            .loans
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.is_unresolved() && l.loan_date <= cutoff)
            .cloned()
            .collect())
    }
}

/// Build the real router over fresh in-memory stores
pub fn test_app() -> Router {
    let repository = Repository::new(
        Arc::new(InMemoryBooks::default()),
        Arc::new(InMemoryLoans::default()),
    );
    let config = AppConfig::default();
    let services = Services::new(repository, &config.scheduler);

    create_router(AppState {
        services: Arc::new(services),
    })
}

/// Send one request and return the status with the decoded JSON body
/// (`Value::Null` when the body is empty)
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
