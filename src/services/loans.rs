//! Loan management service

use chrono::{Duration, NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        loan::{CreateLoan, Loan, LoanFilter},
        page::{Page, PageRequest},
    },
    repository::{loans::BOOK_ALREADY_LOANED, Repository},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    late_loan_days: i64,
}

impl LoansService {
    pub fn new(repository: Repository, late_loan_days: i64) -> Self {
        Self {
            repository,
            late_loan_days,
        }
    }

    /// Lend a book, dated today. Fails when the book is still out.
    pub async fn create(&self, loan: CreateLoan) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("loan book id cant be null.".to_string()))?;

        if self.repository.loans.exists_unreturned_by_book(book_id, None).await? {
            tracing::warn!("Book {} is already loaned", loan.book.isbn);
            return Err(AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string()));
        }

        self.repository.loans.insert(&loan, today()).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        self.repository.loans.find_by_id(id).await
    }

    /// Persist the returned flag of a loan. Reopening a loan fails while
    /// the book is out on another one.
    pub async fn update(&self, loan: Loan) -> AppResult<Loan> {
        let id = loan
            .id
            .ok_or_else(|| AppError::InvalidArgument("loan id cant be null.".to_string()))?;

        if loan.is_unresolved() {
            let book_id = loan
                .book
                .id
                .ok_or_else(|| AppError::InvalidArgument("loan book id cant be null.".to_string()))?;
            if self.repository.loans.exists_unreturned_by_book(book_id, Some(id)).await? {
                tracing::warn!("Cannot reopen loan {}: book {} is out again", id, loan.book.isbn);
                return Err(AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string()));
            }
        }

        self.repository.loans.update(id, &loan).await
    }

    pub async fn find(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<Page<Loan>> {
        self.repository.loans.find_by_isbn_or_customer(filter, page).await
    }

    pub async fn get_loans_by_book(&self, book: &Book, page: PageRequest) -> AppResult<Page<Loan>> {
        let book_id = book
            .id
            .ok_or_else(|| AppError::InvalidArgument("book id cant be null.".to_string()))?;
        self.repository.loans.find_by_book(book_id, page).await
    }

    /// Unresolved loans older than the late threshold
    pub async fn get_all_late_loans(&self) -> AppResult<Vec<Loan>> {
        let cutoff = late_cutoff(today(), self.late_loan_days);
        self.repository.loans.find_late(cutoff).await
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Loans dated on or before the returned day are late
pub fn late_cutoff(today: NaiveDate, late_loan_days: i64) -> NaiveDate {
    today - Duration::days(late_loan_days)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::eq;

    use super::*;
    use crate::repository::{books::MockBooksRepository, loans::MockLoansRepository};

    fn service(loans: MockLoansRepository) -> LoansService {
        LoansService::new(
            Repository::new(Arc::new(MockBooksRepository::new()), Arc::new(loans)),
            4,
        )
    }

    fn book() -> Book {
        Book {
            id: Some(11),
            ..Book::new("1234", "A Identidade Bourne", "Robert Ludlum")
        }
    }

    fn saved_loan(id: i32) -> Loan {
        Loan {
            id: Some(id),
            book: book(),
            customer: "Alex Spezani".to_string(),
            customer_email: Some("alex@email.com".to_string()),
            loan_date: today(),
            returned: None,
        }
    }

    fn create_loan() -> CreateLoan {
        CreateLoan {
            book: book(),
            customer: "Alex Spezani".to_string(),
            customer_email: Some("alex@email.com".to_string()),
        }
    }

    #[test]
    fn test_late_cutoff() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(late_cutoff(today, 4), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[tokio::test]
    async fn test_save_loan() {
        let mut loans = MockLoansRepository::new();
        loans
            .expect_exists_unreturned_by_book()
            .with(eq(11), eq(None))
            .returning(|_, _| Ok(false));
        loans
            .expect_insert()
            .withf(|loan, date| loan.customer == "Alex Spezani" && *date == today())
            .times(1)
            .returning(|_, _| Ok(saved_loan(11)));

        let loan = service(loans).create(create_loan()).await.unwrap();

        assert_eq!(loan.id, Some(11));
        assert_eq!(loan.book, book());
        assert_eq!(loan.loan_date, today());
    }

    #[tokio::test]
    async fn test_loaned_book_save() {
        let mut loans = MockLoansRepository::new();
        loans.expect_exists_unreturned_by_book().returning(|_, _| Ok(true));
        loans.expect_insert().never();

        let err = service(loans).create(create_loan()).await.unwrap_err();

        assert!(matches!(err, AppError::BusinessRule(ref msg) if msg == "Book already loaned."));
    }

    #[tokio::test]
    async fn test_get_loan_details() {
        let mut loans = MockLoansRepository::new();
        loans.expect_find_by_id().with(eq(11)).times(1).returning(|id| Ok(Some(saved_loan(id))));

        let loan = service(loans).get_by_id(11).await.unwrap().unwrap();

        assert_eq!(loan.id, Some(11));
        assert_eq!(loan.customer, "Alex Spezani");
    }

    #[tokio::test]
    async fn test_update_loan() {
        let mut loans = MockLoansRepository::new();
        loans
            .expect_update()
            .withf(|id, loan| *id == 11 && loan.returned == Some(true))
            .returning(|_, loan| Ok(loan.clone()));

        let mut loan = saved_loan(11);
        loan.returned = Some(true);
        let updated = service(loans).update(loan).await.unwrap();

        assert_eq!(updated.returned, Some(true));
    }

    #[tokio::test]
    async fn test_reopen_loan_while_book_is_out() {
        let mut loans = MockLoansRepository::new();
        loans
            .expect_exists_unreturned_by_book()
            .with(eq(11), eq(Some(3)))
            .times(1)
            .returning(|_, _| Ok(true));
        loans.expect_update().never();

        let mut loan = saved_loan(3);
        loan.returned = Some(false);
        let err = service(loans).update(loan).await.unwrap_err();

        assert!(matches!(err, AppError::BusinessRule(ref msg) if msg == BOOK_ALREADY_LOANED));
    }

    #[tokio::test]
    async fn test_reopen_loan_of_available_book() {
        let mut loans = MockLoansRepository::new();
        loans
            .expect_exists_unreturned_by_book()
            .with(eq(11), eq(Some(3)))
            .returning(|_, _| Ok(false));
        loans
            .expect_update()
            .withf(|id, loan| *id == 3 && loan.returned == Some(false))
            .times(1)
            .returning(|_, loan| Ok(loan.clone()));

        let mut loan = saved_loan(3);
        loan.returned = Some(false);
        let updated = service(loans).update(loan).await.unwrap();

        assert_eq!(updated.returned, Some(false));
    }

    #[tokio::test]
    async fn test_find_loans() {
        let mut loans = MockLoansRepository::new();
        loans
            .expect_find_by_isbn_or_customer()
            .withf(|filter, page| filter.isbn() == Some("1234") && page.size == 10)
            .returning(|_, page| Ok(Page::new(vec![saved_loan(11)], page, 1)));

        let filter = LoanFilter {
            isbn: Some("1234".to_string()),
            customer: Some("Alex".to_string()),
        };
        let page = service(loans).find(&filter, PageRequest::new(0, 10)).await.unwrap();

        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content.len(), 1);
    }

    #[tokio::test]
    async fn test_loans_by_book() {
        let mut loans = MockLoansRepository::new();
        loans
            .expect_find_by_book()
            .with(eq(11), eq(PageRequest::new(0, 5)))
            .returning(|_, page| Ok(Page::new(vec![saved_loan(1), saved_loan(2)], page, 2)));

        let page = service(loans)
            .get_loans_by_book(&book(), PageRequest::new(0, 5))
            .await
            .unwrap();

        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test]
    async fn test_late_loans_use_threshold() {
        let mut loans = MockLoansRepository::new();
        loans
            .expect_find_late()
            .withf(|cutoff| *cutoff == today() - Duration::days(4))
            .returning(|_| Ok(vec![saved_loan(1)]));

        let late = service(loans).get_all_late_loans().await.unwrap();

        assert_eq!(late.len(), 1);
    }
}
