//! Loan model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::{non_empty, Book, BookDto};

/// Loan model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Option<i32>,
    pub book: Book,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: Option<bool>,
}

impl Loan {
    /// A loan is unresolved while its returned flag is false or unset
    pub fn is_unresolved(&self) -> bool {
        !self.returned.unwrap_or(false)
    }
}

/// Loan row joined with its book
#[derive(Debug, FromRow)]
pub struct LoanRow {
    pub id: i32,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: Option<bool>,
    pub book_id: i32,
    pub book_isbn: String,
    pub book_title: String,
    pub book_author: String,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Loan {
            id: Some(row.id),
            book: Book {
                id: Some(row.book_id),
                isbn: row.book_isbn,
                title: row.book_title,
                author: row.book_author,
            },
            customer: row.customer,
            customer_email: row.customer_email,
            loan_date: row.loan_date,
            returned: row.returned,
        }
    }
}

/// Data needed to open a loan; the loan date is stamped by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLoan {
    pub book: Book,
    pub customer: String,
    pub customer_email: Option<String>,
}

/// Create loan request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLoanRequest {
    /// ISBN of the book to lend
    #[serde(default)]
    #[validate(length(min = 1, message = "isbn must not be empty"))]
    pub isbn: String,
    /// Customer name
    #[serde(default)]
    #[validate(length(min = 1, message = "customer must not be empty"))]
    pub customer: String,
    /// Customer email, used for late loan notices
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
}

/// Return (or un-return) a loan
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReturnedLoanRequest {
    pub returned: bool,
}

/// Loan transfer object
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanDto {
    pub id: Option<i32>,
    pub isbn: String,
    pub customer: String,
    pub email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: Option<bool>,
    pub book: BookDto,
}

impl From<Loan> for LoanDto {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id,
            isbn: loan.book.isbn.clone(),
            customer: loan.customer,
            email: loan.customer_email,
            loan_date: loan.loan_date,
            returned: loan.returned,
            book: loan.book.into(),
        }
    }
}

/// Loan search filter: a loan matches when its book ISBN equals `isbn`
/// or its customer equals `customer`. With both fields empty every loan matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanFilter {
    pub isbn: Option<String>,
    pub customer: Option<String>,
}

impl LoanFilter {
    pub fn isbn(&self) -> Option<&str> {
        non_empty(&self.isbn)
    }

    pub fn customer(&self) -> Option<&str> {
        non_empty(&self.customer)
    }

    pub fn matches(&self, loan: &Loan) -> bool {
        match (self.isbn(), self.customer()) {
            (None, None) => true,
            (isbn, customer) => {
                isbn.is_some_and(|isbn| loan.book.isbn == isbn)
                    || customer.is_some_and(|customer| loan.customer == customer)
            }
        }
    }
}
