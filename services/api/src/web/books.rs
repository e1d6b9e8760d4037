//! services/api/src/web/books.rs
//!
//! CRUD endpoints for the book catalog. Handlers check field presence and
//! hand everything else straight to the `DatabaseService`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use book_catalog_core::domain::{Book, BookPatch, NewBook};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorResponse};
use crate::web::extract::{explicit_null, json_body, required_non_empty};
use crate::web::state::AppState;

const MISSING_TITLE_OR_AUTHOR: &str = "Title and Author are required";
const BOOK_NOT_FOUND: &str = "Book not found";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_year: Option<i64>,
}

/// Every field is optional. Absent fields keep their stored value; an explicit
/// `null` year clears it.
#[derive(Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<i64>)]
    pub published_year: Option<Option<i64>>,
}

impl From<UpdateBookRequest> for BookPatch {
    fn from(req: UpdateBookRequest) -> Self {
        BookPatch {
            title: req.title,
            author: req.author,
            published_year: req.published_year,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub published_year: Option<i64>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            published_year: book.published_year,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Ids that are not UUIDs cannot name a stored book.
fn book_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(BOOK_NOT_FOUND.to_string()))
}

fn not_found() -> ApiError {
    ApiError::NotFound(BOOK_NOT_FOUND.to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /books - Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Title or author missing", body = ErrorResponse)
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    let new_book = NewBook {
        title: required_non_empty(req.title, MISSING_TITLE_OR_AUTHOR)?,
        author: required_non_empty(req.author, MISSING_TITLE_OR_AUTHOR)?,
        published_year: req.published_year,
    };

    let book = state.db.insert_book(new_book).await?;
    info!(book_id = %book.id, "Book created");
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /books - List every book
#[utoipa::path(
    get,
    path = "/books",
    responses(
        (status = 200, description = "All books in insertion order", body = [BookResponse])
    )
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = state.db.list_books().await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /books/{id} - Fetch one book
#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let id = book_id(&id)?;
    let book = state.db.find_book_by_id(id).await?.ok_or_else(not_found)?;
    Ok(Json(book.into()))
}

/// PUT /books/{id} - Partially update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book identifier")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "The updated book", body = BookResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Json<BookResponse>, ApiError> {
    let id = book_id(&id)?;
    let req = json_body(payload)?;

    // Title and author are not re-checked for emptiness here, unlike create.
    let book = state
        .db
        .update_book(id, req.into())
        .await?
        .ok_or_else(not_found)?;
    info!(book_id = %book.id, "Book updated");
    Ok(Json(book.into()))
}

/// DELETE /books/{id} - Remove a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = String, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = book_id(&id)?;
    if !state.db.delete_book(id).await? {
        return Err(not_found());
    }

    info!(book_id = %id, "Book deleted");
    Ok(Json(MessageResponse {
        message: "Book deleted".to_string(),
    }))
}
