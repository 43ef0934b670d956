//! Repository layer for database operations

pub mod books;
pub mod loans;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use books::{BooksRepository, PgBooksRepository};
pub use loans::{LoansRepository, PgLoansRepository};

/// Main repository struct holding the book and loan stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BooksRepository>,
    pub loans: Arc<dyn LoansRepository>,
}

impl Repository {
    /// Create a repository from explicit store implementations
    pub fn new(books: Arc<dyn BooksRepository>, loans: Arc<dyn LoansRepository>) -> Self {
        Self { books, loans }
    }

    /// Create a Postgres-backed repository with the given database pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(PgBooksRepository::new(pool.clone())),
            loans: Arc::new(PgLoansRepository::new(pool)),
        }
    }
}
