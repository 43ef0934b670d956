//! Data models for the library API

pub mod book;
pub mod loan;
pub mod page;

// Re-export commonly used types
pub use book::{Book, BookDto, BookFilter};
pub use loan::{CreateLoan, Loan, LoanDto, LoanFilter};
pub use page::{Page, PageRequest, PageResponse};
