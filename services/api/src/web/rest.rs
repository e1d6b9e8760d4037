//! services/api/src/web/rest.rs
//!
//! The welcome endpoint and the master definition for the OpenAPI
//! specification.

use crate::error::ErrorResponse;
use crate::web::auth::{AuthResponse, LoginRequest, SignupRequest};
use crate::web::books::{BookResponse, CreateBookRequest, MessageResponse, UpdateBookRequest};
use utoipa::OpenApi;

pub const WELCOME_MESSAGE: &str = "Welcome to Book Information System API";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        welcome_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::books::create_book_handler,
        crate::web::books::list_books_handler,
        crate::web::books::get_book_handler,
        crate::web::books::update_book_handler,
        crate::web::books::delete_book_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            AuthResponse,
            CreateBookRequest,
            UpdateBookRequest,
            BookResponse,
            MessageResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Book Catalog API", description = "Account signup/login and book catalog CRUD.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET / - Plain-text greeting
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome text", body = String, content_type = "text/plain")
    )
)]
pub async fn welcome_handler() -> &'static str {
    WELCOME_MESSAGE
}
