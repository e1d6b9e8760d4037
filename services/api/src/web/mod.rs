pub mod auth;
pub mod books;
pub mod extract;
pub mod rest;
pub mod state;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, ConfigError};
use rest::ApiDoc;
use state::AppState;

// Re-export the handlers so the binary and tests can reach them in one place.
pub use auth::{login_handler, signup_handler};
pub use books::{
    create_book_handler, delete_book_handler, get_book_handler, list_books_handler,
    update_book_handler,
};
pub use rest::welcome_handler;

/// CORS for a browser front end on another origin that sends the session cookie.
///
/// With no configured origins the request's own origin is echoed back, which
/// is the only way to combine "any origin" with credentials.
pub fn cors_layer(config: &Config) -> Result<CorsLayer, ConfigError> {
    let allow_origin = if config.cors_allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins = config
            .cors_allowed_origins
            .iter()
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|e| {
                    ConfigError::InvalidValue("CORS_ALLOWED_ORIGINS".to_string(), e.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Builds the complete application: API routes, CORS, request tracing and
/// the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ConfigError> {
    let cors = cors_layer(&app_state.config)?;

    let api_router = Router::new()
        .route("/", get(welcome_handler))
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route(
            "/books/{id}",
            get(get_book_handler)
                .put(update_book_handler)
                .delete(delete_book_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Swagger UI sits outside the CORS and trace layers above.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
