//! End-to-end tests driving the full router over an in-memory SQLite store.

use api_lib::config::{Config, SessionBackend};
use api_lib::web::{router, state::AppState};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    app: Router,
    state: Arc<AppState>,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    fn session_token(&self) -> Option<String> {
        let cookie = self.headers.get(header::SET_COOKIE)?.to_str().ok()?;
        cookie
            .split(';')
            .find_map(|part| part.trim().strip_prefix("session="))
            .map(str::to_string)
    }
}

async fn spawn_app(session_backend: SessionBackend) -> TestApp {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        session_backend,
        ..Config::default()
    };
    let state = AppState::from_config(config).await.unwrap();
    let app = router(state.clone()).unwrap();
    TestApp { app, state }
}

impl TestApp {
    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        TestResponse { status, headers, body }
    }

    async fn create_book(&self, body: Value) -> Value {
        let res = self.request(Method::POST, "/books", Some(body)).await;
        assert_eq!(res.status, StatusCode::CREATED);
        res.json()
    }
}

//=========================================================================================
// Welcome & docs
//=========================================================================================

#[tokio::test]
async fn root_serves_plain_text_welcome() {
    let app = spawn_app(SessionBackend::Memory).await;
    let res = app.request(Method::GET, "/", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "Welcome to Book Information System API");
    let content_type = res.headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn openapi_document_lists_every_route() {
    let app = spawn_app(SessionBackend::Memory).await;
    let res = app.request(Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(res.status, StatusCode::OK);
    let paths = res.json()["paths"].clone();
    for path in ["/", "/signup", "/login", "/books", "/books/{id}"] {
        assert!(paths.get(path).is_some(), "missing {path}");
    }
}

//=========================================================================================
// Signup & login
//=========================================================================================

#[tokio::test]
async fn signup_creates_account_and_session() {
    let app = spawn_app(SessionBackend::Sqlite).await;
    let res = app
        .request(
            Method::POST,
            "/signup",
            Some(json!({"email": "reader@example.com", "password": "s3cret"})),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["email"], "reader@example.com");
    assert!(body.get("password").is_none());
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let stored = app
        .state
        .db
        .find_account_by_email("reader@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, id);
    assert_ne!(stored.password_hash, "s3cret");

    let token = res.session_token().expect("signup should set a session cookie");
    assert_eq!(
        app.state.sessions.validate_session(&token).await.unwrap(),
        Some(id)
    );
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
    let app = spawn_app(SessionBackend::Memory).await;
    let payload = json!({"email": "dup@example.com", "password": "first"});

    let first = app.request(Method::POST, "/signup", Some(payload)).await;
    assert_eq!(first.status, StatusCode::OK);
    let first_id = first.json()["id"].clone();

    let second = app
        .request(
            Method::POST,
            "/signup",
            Some(json!({"email": "dup@example.com", "password": "second"})),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.json(), json!({"error": "Email already exists"}));
    assert!(second.session_token().is_none());

    // The original password still works; the account was not replaced.
    let login = app
        .request(
            Method::POST,
            "/login",
            Some(json!({"email": "dup@example.com", "password": "first"})),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.json()["id"], first_id);
}

#[tokio::test]
async fn signup_requires_both_fields() {
    let app = spawn_app(SessionBackend::Memory).await;

    for payload in [
        json!({"email": "x@example.com"}),
        json!({"password": "pw"}),
        json!({}),
    ] {
        let res = app.request(Method::POST, "/signup", Some(payload)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert!(res.json()["error"].is_string());
    }

    assert!(app
        .state
        .db
        .find_account_by_email("x@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn login_with_correct_credentials() {
    let app = spawn_app(SessionBackend::Sqlite).await;
    let signup = app
        .request(
            Method::POST,
            "/signup",
            Some(json!({"email": "reader@example.com", "password": "s3cret"})),
        )
        .await;
    let signup_token = signup.session_token().unwrap();

    let res = app
        .request(
            Method::POST,
            "/login",
            Some(json!({"email": "reader@example.com", "password": "s3cret"})),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["id"], signup.json()["id"]);
    assert_eq!(body["email"], "reader@example.com");

    let token = res.session_token().unwrap();
    assert_ne!(token, signup_token);
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(app.state.sessions.validate_session(&token).await.unwrap(), Some(id));
}

#[tokio::test]
async fn failed_logins_are_indistinguishable() {
    let app = spawn_app(SessionBackend::Memory).await;
    app.request(
        Method::POST,
        "/signup",
        Some(json!({"email": "reader@example.com", "password": "s3cret"})),
    )
    .await;

    let wrong_password = app
        .request(
            Method::POST,
            "/login",
            Some(json!({"email": "reader@example.com", "password": "guess"})),
        )
        .await;
    let unknown_email = app
        .request(
            Method::POST,
            "/login",
            Some(json!({"email": "nobody@example.com", "password": "s3cret"})),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.json(), json!({"error": "Unauthorized"}));
    assert!(wrong_password.session_token().is_none());
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = spawn_app(SessionBackend::Memory).await;
    let res = app
        .request(Method::POST, "/login", Some(json!({"email": "a@b.c"})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

//=========================================================================================
// Books
//=========================================================================================

#[tokio::test]
async fn create_book_without_year() {
    let app = spawn_app(SessionBackend::Memory).await;
    let book = app
        .create_book(json!({"title": "Dune", "author": "Herbert"}))
        .await;

    assert!(book["id"].as_str().unwrap().parse::<Uuid>().is_ok());
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["author"], "Herbert");
    assert_eq!(book["published_year"], Value::Null);
}

#[tokio::test]
async fn create_book_requires_title_and_author() {
    let app = spawn_app(SessionBackend::Memory).await;

    for payload in [
        json!({"author": "Herbert"}),
        json!({"title": "Dune"}),
        json!({"title": "", "author": "Herbert"}),
        json!({"title": "Dune", "author": ""}),
    ] {
        let res = app.request(Method::POST, "/books", Some(payload)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.json(), json!({"error": "Title and Author are required"}));
    }

    let list = app.request(Method::GET, "/books", None).await;
    assert_eq!(list.json(), json!([]));
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = spawn_app(SessionBackend::Memory).await;

    let not_json = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.send(not_json).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["error"].is_string());

    let wrong_type = app
        .request(
            Method::POST,
            "/books",
            Some(json!({"title": "Dune", "author": "Herbert", "published_year": "1965"})),
        )
        .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn published_year_has_no_range_limit() {
    let app = spawn_app(SessionBackend::Memory).await;
    let book = app
        .create_book(json!({"title": "Far Future", "author": "Nobody", "published_year": 3000000000i64}))
        .await;
    assert_eq!(book["published_year"], 3000000000i64);
    let uri = format!("/books/{}", book["id"].as_str().unwrap());
    assert_eq!(app.request(Method::GET, &uri, None).await.json(), book);

    let res = app
        .request(Method::PUT, &uri, Some(json!({"published_year": -50000})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["published_year"], -50000);
}

#[tokio::test]
async fn list_returns_books_in_insertion_order() {
    let app = spawn_app(SessionBackend::Memory).await;
    let dune = app
        .create_book(json!({"title": "Dune", "author": "Herbert", "published_year": 1965}))
        .await;
    let emma = app
        .create_book(json!({"title": "Emma", "author": "Austen"}))
        .await;

    let res = app.request(Method::GET, "/books", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!([dune, emma]));
}

#[tokio::test]
async fn get_book_is_repeatable() {
    let app = spawn_app(SessionBackend::Memory).await;
    let book = app
        .create_book(json!({"title": "Dune", "author": "Herbert", "published_year": 1965}))
        .await;
    let uri = format!("/books/{}", book["id"].as_str().unwrap());

    let first = app.request(Method::GET, &uri, None).await;
    let second = app.request(Method::GET, &uri, None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json(), book);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn get_unknown_book_is_not_found() {
    let app = spawn_app(SessionBackend::Memory).await;

    for uri in [format!("/books/{}", Uuid::new_v4()), "/books/42".to_string()] {
        let res = app.request(Method::GET, &uri, None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.json(), json!({"error": "Book not found"}));
    }
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let app = spawn_app(SessionBackend::Memory).await;
    let book = app
        .create_book(json!({"title": "Dune", "author": "Herbert", "published_year": 1965}))
        .await;
    let uri = format!("/books/{}", book["id"].as_str().unwrap());

    let res = app
        .request(Method::PUT, &uri, Some(json!({"author": "New Author"})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let expected = json!({
        "id": book["id"],
        "title": "Dune",
        "author": "New Author",
        "published_year": 1965,
    });
    assert_eq!(res.json(), expected);
    assert_eq!(app.request(Method::GET, &uri, None).await.json(), expected);
}

#[tokio::test]
async fn update_does_not_revalidate_title() {
    let app = spawn_app(SessionBackend::Memory).await;
    let book = app
        .create_book(json!({"title": "Dune", "author": "Herbert", "published_year": 1965}))
        .await;
    let uri = format!("/books/{}", book["id"].as_str().unwrap());

    // The front end sends the whole record back, id included.
    let res = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({"id": book["id"], "title": "", "published_year": null})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["title"], "");
    assert_eq!(body["author"], "Herbert");
    assert_eq!(body["published_year"], Value::Null);
}

#[tokio::test]
async fn update_unknown_book_is_not_found() {
    let app = spawn_app(SessionBackend::Memory).await;
    let res = app
        .request(
            Method::PUT,
            &format!("/books/{}", Uuid::new_v4()),
            Some(json!({"title": "Ghost"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = spawn_app(SessionBackend::Memory).await;
    let book = app
        .create_book(json!({"title": "Dune", "author": "Herbert"}))
        .await;
    let uri = format!("/books/{}", book["id"].as_str().unwrap());

    let res = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"message": "Book deleted"}));

    assert_eq!(app.request(Method::GET, &uri, None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.request(Method::DELETE, &uri, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_book_is_not_found() {
    let app = spawn_app(SessionBackend::Memory).await;
    let res = app
        .request(Method::DELETE, &format!("/books/{}", Uuid::new_v4()), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json(), json!({"error": "Book not found"}));
}

//=========================================================================================
// CORS
//=========================================================================================

#[tokio::test]
async fn cors_mirrors_origin_with_credentials() {
    let app = spawn_app(SessionBackend::Memory).await;
    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/books")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let res = app.send(preflight).await;
    assert!(res.status.is_success());
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn cors_respects_configured_origins() {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        session_backend: SessionBackend::Memory,
        cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        ..Config::default()
    };
    let state = AppState::from_config(config).await.unwrap();
    let app = TestApp {
        app: router(state.clone()).unwrap(),
        state,
    };

    let allowed = Request::builder()
        .uri("/books")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let res = app.send(allowed).await;
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );

    let other = Request::builder()
        .uri("/books")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let res = app.send(other).await;
    assert!(res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
