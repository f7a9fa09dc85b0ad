#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use libris_app::App;
use libris_kernel::{settings::Settings, Database};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN: &str = "admin-secret";
pub const USER: &str = "reader-secret";

const BOUNDARY: &str = "libris-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub media: TempDir,
}

/// Fresh app on a private in-memory database and media directory.
pub async fn spawn() -> TestApp {
    let media = tempfile::tempdir().unwrap();

    let mut settings = Settings::default();
    settings.auth.admin_tokens = vec![ADMIN.to_string()];
    settings.auth.user_tokens = vec![USER.to_string()];
    settings.media.root = media.path().to_path_buf();

    let db = Database::in_memory().await.unwrap();
    let app = App::with_database(settings, db.clone()).await.unwrap();

    TestApp {
        router: app.router(),
        db,
        media,
    }
}

/// Multipart body builder.
#[derive(Default, Clone)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl std::fmt::Display) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// Valid book form for `author`.
pub fn book_form(title: &str, author: i64, year: i64, publisher: &str, book_type: &str) -> Form {
    Form::new()
        .text("title", title)
        .text("author", author)
        .text("year", year)
        .text("genre", "Учебная литература")
        .text("category", "Учебник")
        .text("publisher", publisher)
        .text("book_type", book_type)
        .file("book_file", "book.pdf", b"%PDF-1.4 test")
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        builder
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Self::request(Method::GET, uri, None).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(
            Self::request(method, uri, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        form: Form,
    ) -> (StatusCode, Value) {
        self.send(
            Self::request(method, uri, token)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(form.finish()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Self::request(Method::DELETE, uri, token).body(Body::empty()).unwrap())
            .await
    }

    /// Create an author as admin and return its id.
    pub async fn author(&self, name: &str) -> i64 {
        let (status, body) = self
            .json(Method::POST, "/api/authors/", Some(ADMIN), json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_book(&self, form: Form) -> (StatusCode, Value) {
        self.multipart(Method::POST, "/api/books/", Some(ADMIN), form)
            .await
    }
}
