//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for account signup and login.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{
        rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};
use book_catalog_core::domain::AuthSession;
use book_catalog_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ApiError, ErrorResponse};
use crate::web::extract::{json_body, required};
use crate::web::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

const MISSING_CREDENTIALS: &str = "Email and password are required";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub id: Uuid,
    pub email: String,
}

struct Credentials {
    email: String,
    password: String,
}

fn credentials(email: Option<String>, password: Option<String>) -> Result<Credentials, ApiError> {
    Ok(Credentials {
        email: required(email, MISSING_CREDENTIALS)?,
        password: required(password, MISSING_CREDENTIALS)?,
    })
}

//=========================================================================================
// Password Hashing
//=========================================================================================

/// Hashes `password` with Argon2 and a fresh random salt, in PHC string form.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

/// Checks `password` against a PHC string produced by [`hash_password`].
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Stored password hash is unreadable".to_string())
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => {
            error!("Failed to verify password: {:?}", e);
            Err(ApiError::Internal("Failed to verify password".to_string()))
        }
    }
}

//=========================================================================================
// Session Cookie
//=========================================================================================

/// Renders the `Set-Cookie` value for a freshly issued session.
pub fn session_cookie(session: &AuthSession, config: &Config) -> String {
    let max_age = (session.expires_at - session.created_at).num_seconds().max(0);
    let secure = if config.session_cookie_secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE, session.token, max_age, secure
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /signup - Create a new account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created and session started", body = AuthResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    let Credentials { email, password } = credentials(req.email, req.password)?;

    // 1. Refuse duplicates up front. The UNIQUE constraint covers the race.
    if state.db.find_account_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    // 2. Hash the password and create the account
    let password_hash = hash_password(&password)?;
    let account = state
        .db
        .insert_account(&email, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => {
                ApiError::Conflict("Email already exists".to_string())
            }
            other => ApiError::Port(other),
        })?;

    // 3. Start a session for the new account
    let session = state.sessions.create_session(account.id).await?;
    let cookie = session_cookie(&session, &state.config);
    info!(account_id = %account.id, "Account created");

    let response = AuthResponse {
        id: account.id,
        email: account.email,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /login - Login with an existing account
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    let Credentials { email, password } = credentials(req.email, req.password)?;

    // 1. Unknown email and wrong password end in the same error.
    let Some(creds) = state.db.find_account_by_email(&email).await? else {
        warn!("Login attempt for unknown email");
        return Err(ApiError::Unauthorized);
    };

    // 2. Verify password
    if !verify_password(&password, &creds.password_hash)? {
        warn!(account_id = %creds.id, "Login attempt with wrong password");
        return Err(ApiError::Unauthorized);
    }

    // 3. Start a session
    let session = state.sessions.create_session(creds.id).await?;
    let cookie = session_cookie(&session, &state.config);
    info!(account_id = %creds.id, "Account logged in");

    let response = AuthResponse {
        id: creds.id,
        email: creds.email,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(response)))
}
