mod common;

use axum::http::{Method, StatusCode};
use common::{book_form, spawn, ADMIN, USER};
use serde_json::json;

#[tokio::test]
async fn author_crud_round() {
    let app = spawn().await;

    let (status, author) = app
        .json(
            Method::POST,
            "/api/authors/",
            Some(ADMIN),
            json!({ "name": "Лев Толстой", "biography": "Русский писатель" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{author}");
    assert_eq!(author["books"], json!([]));
    let uri = format!("/api/authors/{}/", author["id"]);

    let (status, body) = app
        .json(Method::PATCH, &uri, Some(ADMIN), json!({ "biography": "Граф" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Лев Толстой");
    assert_eq!(body["biography"], "Граф");

    let (status, body) = app
        .json(Method::PUT, &uri, Some(ADMIN), json!({ "name": "Л. Н. Толстой" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Л. Н. Толстой");

    let (status, _) = app.delete(&uri, Some(ADMIN)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn author_lists_their_books() {
    let app = spawn().await;
    let author = app.author("Пёрышкин").await;
    app.create_book(book_form("Физика", author, 2020, "Дрофа", "textbook"))
        .await;

    let (status, body) = app.get(&format!("/api/authors/{author}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"][0]["title"], "Физика");
}

#[tokio::test]
async fn author_names_are_unique() {
    let app = spawn().await;
    app.author("Пушкин").await;

    let (status, body) = app
        .json(Method::POST, "/api/authors/", Some(ADMIN), json!({ "name": "Пушкин" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"], json!(["author with this name already exists."]));
}

#[tokio::test]
async fn author_writes_need_admin() {
    let app = spawn().await;

    let (status, _) = app
        .json(Method::POST, "/api/authors/", Some(USER), json!({ "name": "Гоголь" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(Method::POST, "/api/authors/", Some("nope"), json!({ "name": "Гоголь" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, page) = app.get("/api/authors/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 0);
}

#[tokio::test]
async fn author_search_covers_biography() {
    let app = spawn().await;
    app.json(
        Method::POST,
        "/api/authors/",
        Some(ADMIN),
        json!({ "name": "Чехов", "biography": "Врач и драматург" }),
    )
    .await;
    app.author("Гоголь").await;

    let (_, page) = app.get("/api/authors/?search=ДРАМАТУРГ").await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["name"], "Чехов");
}

#[tokio::test]
async fn blank_author_name_is_rejected() {
    let app = spawn().await;
    let (status, body) = app
        .json(Method::POST, "/api/authors/", Some(ADMIN), json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"], json!(["This field may not be blank."]));
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let app = spawn().await;
    for uri in ["/api/authors/abc/", "/api/authors/0/", "/api/authors/77/"] {
        let (status, _) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}
