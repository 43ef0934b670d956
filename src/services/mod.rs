//! Business logic services

pub mod books;
pub mod email;
pub mod loans;
pub mod scheduler;

use crate::{config::SchedulerConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, scheduler_config: &SchedulerConfig) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            loans: loans::LoansService::new(repository, scheduler_config.late_loan_days),
        }
    }
}
