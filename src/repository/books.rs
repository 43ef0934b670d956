//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter},
        page::{Page, PageRequest},
    },
};

pub const DUPLICATE_ISBN: &str = "ISBN already registered.";
pub const BOOK_HAS_LOANS: &str = "Book has loans and cannot be deleted.";

/// Persistence operations on the book catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool>;

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>>;

    /// Insert a new book and return it with its generated id
    async fn insert(&self, book: &Book) -> AppResult<Book>;

    /// Update title and author of a persisted book
    async fn update(&self, id: i32, book: &Book) -> AppResult<Book>;

    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn find_all(&self, filter: &BookFilter, page: PageRequest) -> AppResult<Page<Book>>;
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Append the filter predicates; every non-empty field is ANDed as an ILIKE match
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    builder.push(" WHERE 1=1");
    let columns = [
        ("isbn", filter.isbn()),
        ("title", filter.title()),
        ("author", filter.author()),
    ];
    for (column, value) in columns {
        if let Some(value) = value {
            builder
                .push(format!(" AND {} ILIKE ", column))
                .push_bind(format!("%{}%", escape_like(value)));
        }
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, isbn, title, author FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, isbn, title, author FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, title, author)
            VALUES ($1, $2, $3)
            RETURNING id, isbn, title, author
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::BusinessRule(DUPLICATE_ISBN.to_string())
            }
            e => AppError::Database(e),
        })
    }

    async fn update(&self, id: i32, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET title = $1, author = $2
            WHERE id = $3
            RETURNING id, isbn, title, author
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    AppError::BusinessRule(BOOK_HAS_LOANS.to_string())
                }
                e => AppError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn find_all(&self, filter: &BookFilter, page: PageRequest) -> AppResult<Page<Book>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT id, isbn, title, author FROM books");
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.size)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let books = select.build_query_as::<Book>().fetch_all(&self.pool).await?;

        Ok(Page::new(books, page, total))
    }
}
