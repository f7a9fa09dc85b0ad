mod common;

use axum::http::StatusCode;
use common::spawn;

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = spawn().await;

    let (status, _) = app.get("/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let (status, doc) = app.get("/docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    for path in ["/api/books/", "/api/books/{id}/", "/api/authors/", "/api/genres/{id}/"] {
        assert!(doc["paths"][path].is_object(), "{path}");
    }
    assert!(doc["components"]["schemas"]["BookForm"].is_object());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let app = spawn().await;
    let registry_migrations = {
        let mut registry = libris_kernel::ModuleRegistry::new();
        libris_app::modules::register_all(&mut registry);
        registry.collect_migrations()
    };
    let applied = app.db.apply_migrations(&registry_migrations).await.unwrap();
    assert_eq!(applied, 0);
}
