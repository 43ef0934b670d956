//! Book (catalog) endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDto, BookFilter},
        loan::LoanDto,
        page::{BookPage, LoanPage, PageParams, PageResponse},
    },
    AppState,
};

use super::{PathParam, QueryParams, ValidatedJson};

async fn require_book(state: &AppState, id: i32) -> AppResult<Book> {
    state
        .services
        .books
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body = BookDto,
    responses(
        (status = 201, description = "Book created", body = BookDto),
        (status = 400, description = "Invalid input or duplicate ISBN")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<BookDto>,
) -> AppResult<(StatusCode, Json<BookDto>)> {
    tracing::info!("Creating a book for isbn: {}", dto.isbn);

    let created = state.services.books.create(Book::from(dto)).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Find a book's details by id
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDto),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> AppResult<Json<BookDto>> {
    tracing::info!("Get book details for book id: {}", id);

    let book = require_book(&state, id).await?;
    Ok(Json(book.into()))
}

/// Delete a book by id
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Book has loans"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> AppResult<StatusCode> {
    tracing::info!("Delete book of id: {}", id);

    let book = require_book(&state, id).await?;
    state.services.books.delete(&book).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Update a book's title and author
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookDto,
    responses(
        (status = 200, description = "Book updated", body = BookDto),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    ValidatedJson(dto): ValidatedJson<BookDto>,
) -> AppResult<Json<BookDto>> {
    tracing::info!("Update book of id: {}", id);

    let mut book = require_book(&state, id).await?;
    book.title = dto.title;
    book.author = dto.author;

    let updated = state.services.books.update(book).await?;
    Ok(Json(updated.into()))
}

/// Search books
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    params(BookFilter, PageParams),
    responses(
        (status = 200, description = "Page of matching books", body = BookPage)
    )
)]
pub async fn find_books(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<BookFilter>,
    QueryParams(page): QueryParams<PageParams>,
) -> AppResult<Json<BookPage>> {
    tracing::info!("Get all books");

    let result = state.services.books.find(&filter, page.into()).await?;
    Ok(Json(PageResponse::from(result.map(BookDto::from))))
}

/// List all loans of a book
#[utoipa::path(
    get,
    path = "/api/books/{id}/loans",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID"),
        PageParams
    ),
    responses(
        (status = 200, description = "Page of the book's loans", body = LoanPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn loans_by_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    QueryParams(page): QueryParams<PageParams>,
) -> AppResult<Json<LoanPage>> {
    tracing::info!("Get all loans from book id: {}", id);

    let book = require_book(&state, id).await?;
    let result = state.services.loans.get_loans_by_book(&book, page.into()).await?;
    Ok(Json(PageResponse::from(result.map(LoanDto::from))))
}

