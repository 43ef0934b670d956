//! Loan management endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, CreateLoanRequest, LoanDto, LoanFilter, ReturnedLoanRequest},
        page::{LoanPage, PageParams, PageResponse},
    },
    AppState,
};

use super::{PathParam, QueryParams, ValidatedJson};

pub const BOOK_NOT_FOUND_FOR_ISBN: &str = "Book not found for passed isbn";

/// Create a loan
#[utoipa::path(
    post,
    path = "/api/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created, body is the loan id", body = i32),
        (status = 400, description = "Unknown ISBN or book already loaned")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<i32>)> {
    tracing::info!("Creating a loan for isbn: {}", request.isbn);

    let book = state
        .services
        .books
        .get_by_isbn(&request.isbn)
        .await?
        .ok_or_else(|| AppError::BusinessRule(BOOK_NOT_FOUND_FOR_ISBN.to_string()))?;

    let loan = state
        .services
        .loans
        .create(CreateLoan {
            book,
            customer: request.customer,
            customer_email: request.email,
        })
        .await?;

    let id = loan
        .id
        .ok_or_else(|| AppError::Internal("Loan id is null".to_string()))?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// Return (or un-return) a loan by id
#[utoipa::path(
    patch,
    path = "/api/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ReturnedLoanRequest,
    responses(
        (status = 200, description = "Loan updated", body = LoanDto),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    ValidatedJson(request): ValidatedJson<ReturnedLoanRequest>,
) -> AppResult<Json<LoanDto>> {
    tracing::info!("Set returned={} on loan id: {}", request.returned, id);

    let mut loan = state
        .services
        .loans
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;
    loan.returned = Some(request.returned);

    let updated = state.services.loans.update(loan).await?;
    Ok(Json(updated.into()))
}

/// Find loans by ISBN or customer
#[utoipa::path(
    get,
    path = "/api/loans",
    tag = "loans",
    params(LoanFilter, PageParams),
    responses(
        (status = 200, description = "Page of matching loans", body = LoanPage)
    )
)]
pub async fn find_loans(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<LoanFilter>,
    QueryParams(page): QueryParams<PageParams>,
) -> AppResult<Json<LoanPage>> {
    tracing::info!("Find loans");

    let result = state.services.loans.find(&filter, page.into()).await?;
    Ok(Json(PageResponse::from(result.map(LoanDto::from))))
}
