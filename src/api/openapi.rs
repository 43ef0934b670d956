//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "0.1.0",
        description = "Book catalog and loan tracking REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::create_book,
        books::get_book,
        books::delete_book,
        books::update_book,
        books::find_books,
        books::loans_by_book,
        // Loans
        loans::create_loan,
        loans::return_book,
        loans::find_loans,
    ),
    components(
        schemas(
            // Books
            crate::models::book::BookDto,
            crate::models::book::BookFilter,
            crate::models::page::Pageable,
            crate::models::page::BookPage,
            crate::models::page::LoanPage,
            // Loans
            crate::models::loan::CreateLoanRequest,
            crate::models::loan::ReturnedLoanRequest,
            crate::models::loan::LoanDto,
            crate::models::loan::LoanFilter,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "loans", description = "Loan management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
