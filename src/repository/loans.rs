//! Loans repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, Loan, LoanFilter, LoanRow},
        page::{Page, PageRequest},
    },
};

pub const BOOK_ALREADY_LOANED: &str = "Book already loaned.";

const LOAN_SELECT: &str = r#"
    SELECT l.id, l.customer, l.customer_email, l.loan_date, l.returned,
           b.id AS book_id, b.isbn AS book_isbn, b.title AS book_title, b.author AS book_author
    FROM loans l
    JOIN books b ON b.id = l.book_id
"#;

/// Persistence operations on loans
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoansRepository: Send + Sync {
    /// Whether the book has a loan whose returned flag is false or unset,
    /// ignoring the loan `except` when given
    async fn exists_unreturned_by_book(&self, book_id: i32, except: Option<i32>) -> AppResult<bool>;

    /// Whether the book has ever been loaned
    async fn exists_by_book(&self, book_id: i32) -> AppResult<bool>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>>;

    async fn insert(&self, loan: &CreateLoan, loan_date: NaiveDate) -> AppResult<Loan>;

    /// Persist the returned flag of an existing loan
    async fn update(&self, id: i32, loan: &Loan) -> AppResult<Loan>;

    async fn find_by_isbn_or_customer(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<Page<Loan>>;

    async fn find_by_book(&self, book_id: i32, page: PageRequest) -> AppResult<Page<Loan>>;

    /// Unresolved loans made on or before `cutoff`
    async fn find_late(&self, cutoff: NaiveDate) -> AppResult<Vec<Loan>>;
}

#[derive(Clone)]
pub struct PgLoansRepository {
    pool: Pool<Postgres>,
}

impl PgLoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &LoanFilter) {
    match (filter.isbn(), filter.customer()) {
        (None, None) => {}
        (isbn, customer) => {
            builder.push(" WHERE (b.isbn = ").push_bind(isbn.map(str::to_string));
            builder.push(" OR l.customer = ").push_bind(customer.map(str::to_string));
            builder.push(")");
        }
    }
}

#[async_trait]
impl LoansRepository for PgLoansRepository {
    async fn exists_unreturned_by_book(&self, book_id: i32, except: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE book_id = $1 AND returned IS NOT TRUE
                  AND ($2::INTEGER IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(book_id)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn exists_by_book(&self, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1)")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let row = sqlx::query_as::<_, LoanRow>(&format!("{} WHERE l.id = $1", LOAN_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Loan::from))
    }

    async fn insert(&self, loan: &CreateLoan, loan_date: NaiveDate) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("loan book id cant be null.".to_string()))?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loans (book_id, customer, customer_email, loan_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(&loan.customer)
        .bind(&loan.customer_email)
        .bind(loan_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string())
            }
            e => AppError::Database(e),
        })?;

        Ok(Loan {
            id: Some(id),
            book: loan.book.clone(),
            customer: loan.customer.clone(),
            customer_email: loan.customer_email.clone(),
            loan_date,
            returned: None,
        })
    }

    async fn update(&self, id: i32, loan: &Loan) -> AppResult<Loan> {
        let result = sqlx::query("UPDATE loans SET returned = $1 WHERE id = $2")
            .bind(loan.returned)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                // Un-returning a loan while the book is out again
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string())
                }
                e => AppError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    async fn find_by_isbn_or_customer(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<Page<Loan>> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM loans l JOIN books b ON b.id = l.book_id",
        );
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(LOAN_SELECT);
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY l.id LIMIT ")
            .push_bind(page.size)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as::<LoanRow>().fetch_all(&self.pool).await?;

        Ok(Page::new(rows.into_iter().map(Loan::from).collect(), page, total))
    }

    async fn find_by_book(&self, book_id: i32, page: PageRequest) -> AppResult<Page<Loan>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.book_id = $1 ORDER BY l.id LIMIT $2 OFFSET $3",
            LOAN_SELECT
        ))
        .bind(book_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rows.into_iter().map(Loan::from).collect(), page, total))
    }

    async fn find_late(&self, cutoff: NaiveDate) -> AppResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.returned IS NOT TRUE AND l.loan_date <= $1 ORDER BY l.loan_date, l.id",
            LOAN_SELECT
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Loan::from).collect())
    }
}
