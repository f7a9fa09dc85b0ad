use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use libris_authz::{authorize, Entity, Operation};
use libris_http::{AppError, CurrentCaller};
use libris_kernel::settings::PaginationSettings;

use super::form::BookForm;
use super::models::Book;
use super::service::BookService;
use crate::utils::{
    fields::WriteMode,
    pagination::{ListQuery, Page},
    parse_id, search,
};

pub struct BooksState {
    pub service: BookService,
    pub pagination: PaginationSettings,
}

/// Registers HTTP routes for the Books module.
pub fn router(state: Arc<BooksState>) -> Router {
    Router::new()
        .route("/api/books/", get(list_books).post(create_book))
        .route(
            "/api/books/{id}/",
            get(retrieve_book)
                .put(update_book)
                .patch(partial_update_book)
                .delete(delete_book),
        )
        .with_state(state)
}

async fn list_books(
    State(state): State<Arc<BooksState>>,
    CurrentCaller(caller): CurrentCaller,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Book>>, AppError> {
    authorize(Entity::Book, Operation::List, caller)?;

    let books = search::filter(
        state.service.repo().list().await?,
        query.search.as_deref(),
        |b| {
            vec![
                b.title.as_str(),
                b.genre.as_str(),
                b.category.as_str(),
                b.publisher.as_str(),
                b.author_name.as_str(),
            ]
        },
    );
    Ok(Json(Page::paginate(books, &query, &state.pagination)?))
}

async fn retrieve_book(
    State(state): State<Arc<BooksState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    authorize(Entity::Book, Operation::Retrieve, caller)?;
    Ok(Json(state.service.repo().get(parse_id(&id)?).await?))
}

async fn create_book(
    State(state): State<Arc<BooksState>>,
    CurrentCaller(caller): CurrentCaller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    authorize(Entity::Book, Operation::Create, caller)?;

    let form = read_form(multipart).await?;
    Ok((StatusCode::CREATED, Json(state.service.create(form).await?)))
}

async fn update_book(
    State(state): State<Arc<BooksState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Book>, AppError> {
    authorize(Entity::Book, Operation::Update, caller)?;
    write_update(&state, &id, multipart, WriteMode::Replace).await
}

async fn partial_update_book(
    State(state): State<Arc<BooksState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Book>, AppError> {
    authorize(Entity::Book, Operation::PartialUpdate, caller)?;
    write_update(&state, &id, multipart, WriteMode::Partial).await
}

async fn delete_book(
    State(state): State<Arc<BooksState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    authorize(Entity::Book, Operation::Delete, caller)?;

    state.service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn write_update(
    state: &BooksState,
    id: &str,
    multipart: Result<Multipart, MultipartRejection>,
    mode: WriteMode,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(id)?;
    let form = read_form(multipart).await?;
    Ok(Json(state.service.update(id, form, mode).await?))
}

async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<BookForm, AppError> {
    let multipart = multipart.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    BookForm::from_multipart(multipart).await
}
