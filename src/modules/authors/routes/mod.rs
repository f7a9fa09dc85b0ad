use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use libris_authz::{authorize, Entity, Operation};
use libris_db::StoreError;
use libris_http::{AppError, CurrentCaller};
use libris_kernel::{settings::PaginationSettings, ValidationErrors};

use super::models::{Author, AuthorFields, AuthorPayload, NAME_TAKEN};
use super::repository::AuthorRepository;
use crate::utils::{
    fields::WriteMode,
    json_payload,
    pagination::{ListQuery, Page},
    parse_id, search,
};

pub struct AuthorsState {
    pub repo: AuthorRepository,
    pub pagination: PaginationSettings,
}

/// Registers HTTP routes for the Authors module.
pub fn router(state: Arc<AuthorsState>) -> Router {
    Router::new()
        .route("/api/authors/", get(list_authors).post(create_author))
        .route(
            "/api/authors/{id}/",
            get(retrieve_author)
                .put(update_author)
                .patch(partial_update_author)
                .delete(delete_author),
        )
        .with_state(state)
}

async fn list_authors(
    State(state): State<Arc<AuthorsState>>,
    CurrentCaller(caller): CurrentCaller,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Author>>, AppError> {
    authorize(Entity::Author, Operation::List, caller)?;

    let authors = search::filter(state.repo.list().await?, query.search.as_deref(), |a| {
        vec![a.name.as_str(), a.biography.as_str()]
    });
    Ok(Json(Page::paginate(authors, &query, &state.pagination)?))
}

async fn retrieve_author(
    State(state): State<Arc<AuthorsState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<Json<Author>, AppError> {
    authorize(Entity::Author, Operation::Retrieve, caller)?;
    Ok(Json(state.repo.get(parse_id(&id)?).await?))
}

async fn create_author(
    State(state): State<Arc<AuthorsState>>,
    CurrentCaller(caller): CurrentCaller,
    payload: Result<Json<AuthorPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Author>), AppError> {
    authorize(Entity::Author, Operation::Create, caller)?;

    let fields = json_payload(payload)?.resolve(WriteMode::Create, None)?;
    ensure_name_free(&state.repo, &fields, None).await?;
    let id = state.repo.insert(&fields).await.map_err(name_conflict)?;

    tracing::info!(author_id = id, "author created");
    Ok((StatusCode::CREATED, Json(state.repo.get(id).await?)))
}

async fn update_author(
    State(state): State<Arc<AuthorsState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    payload: Result<Json<AuthorPayload>, JsonRejection>,
) -> Result<Json<Author>, AppError> {
    authorize(Entity::Author, Operation::Update, caller)?;
    write_update(&state, &id, payload, WriteMode::Replace).await
}

async fn partial_update_author(
    State(state): State<Arc<AuthorsState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    payload: Result<Json<AuthorPayload>, JsonRejection>,
) -> Result<Json<Author>, AppError> {
    authorize(Entity::Author, Operation::PartialUpdate, caller)?;
    write_update(&state, &id, payload, WriteMode::Partial).await
}

async fn delete_author(
    State(state): State<Arc<AuthorsState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    authorize(Entity::Author, Operation::Delete, caller)?;

    let id = parse_id(&id)?;
    state.repo.delete(id).await?;
    tracing::info!(author_id = id, "author deleted with their books");
    Ok(StatusCode::NO_CONTENT)
}

async fn write_update(
    state: &AuthorsState,
    id: &str,
    payload: Result<Json<AuthorPayload>, JsonRejection>,
    mode: WriteMode,
) -> Result<Json<Author>, AppError> {
    let id = parse_id(id)?;
    let current = state.repo.get(id).await?;

    let fields = json_payload(payload)?.resolve(mode, Some(&current))?;
    ensure_name_free(&state.repo, &fields, Some(id)).await?;
    state.repo.update(id, &fields).await.map_err(name_conflict)?;

    tracing::info!(author_id = id, ?mode, "author updated");
    Ok(Json(state.repo.get(id).await?))
}

async fn ensure_name_free(
    repo: &AuthorRepository,
    fields: &AuthorFields,
    exclude: Option<i64>,
) -> Result<(), AppError> {
    if repo.name_taken(&fields.name, exclude).await? {
        return Err(ValidationErrors::field("name", NAME_TAKEN).into());
    }
    Ok(())
}

/// A concurrent writer can claim the name between the check and the write;
/// the unique index reports it the same way.
fn name_conflict(err: StoreError) -> AppError {
    if err.is_unique_violation() {
        ValidationErrors::field("name", NAME_TAKEN).into()
    } else {
        err.into()
    }
}
