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

use super::models::{Genre, GenrePayload, NAME_TAKEN};
use super::repository::GenreRepository;
use crate::utils::{
    fields::WriteMode,
    json_payload,
    pagination::{ListQuery, Page},
    parse_id, search,
};

pub struct GenresState {
    pub repo: GenreRepository,
    pub pagination: PaginationSettings,
}

/// Registers HTTP routes for the Genres module.
pub fn router(state: Arc<GenresState>) -> Router {
    Router::new()
        .route("/api/genres/", get(list_genres).post(create_genre))
        .route(
            "/api/genres/{id}/",
            get(retrieve_genre)
                .put(update_genre)
                .patch(partial_update_genre)
                .delete(delete_genre),
        )
        .with_state(state)
}

async fn list_genres(
    State(state): State<Arc<GenresState>>,
    CurrentCaller(caller): CurrentCaller,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Genre>>, AppError> {
    authorize(Entity::Genre, Operation::List, caller)?;

    let genres = search::filter(state.repo.list().await?, query.search.as_deref(), |g| {
        vec![g.name.as_str()]
    });
    Ok(Json(Page::paginate(genres, &query, &state.pagination)?))
}

async fn retrieve_genre(
    State(state): State<Arc<GenresState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<Json<Genre>, AppError> {
    authorize(Entity::Genre, Operation::Retrieve, caller)?;
    Ok(Json(state.repo.get(parse_id(&id)?).await?))
}

async fn create_genre(
    State(state): State<Arc<GenresState>>,
    CurrentCaller(caller): CurrentCaller,
    payload: Result<Json<GenrePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Genre>), AppError> {
    authorize(Entity::Genre, Operation::Create, caller)?;

    let name = json_payload(payload)?.resolve(WriteMode::Create, None)?;
    if state.repo.name_taken(&name, None).await? {
        return Err(ValidationErrors::field("name", NAME_TAKEN).into());
    }
    let genre = state.repo.insert(&name).await.map_err(name_conflict)?;

    tracing::info!(genre_id = genre.id, "genre created");
    Ok((StatusCode::CREATED, Json(genre)))
}

async fn update_genre(
    State(state): State<Arc<GenresState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    payload: Result<Json<GenrePayload>, JsonRejection>,
) -> Result<Json<Genre>, AppError> {
    authorize(Entity::Genre, Operation::Update, caller)?;
    rename(&state, &id, payload, WriteMode::Replace).await
}

async fn partial_update_genre(
    State(state): State<Arc<GenresState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    payload: Result<Json<GenrePayload>, JsonRejection>,
) -> Result<Json<Genre>, AppError> {
    authorize(Entity::Genre, Operation::PartialUpdate, caller)?;
    rename(&state, &id, payload, WriteMode::Partial).await
}

async fn delete_genre(
    State(state): State<Arc<GenresState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    authorize(Entity::Genre, Operation::Delete, caller)?;

    let id = parse_id(&id)?;
    state.repo.delete(id).await?;
    tracing::info!(genre_id = id, "genre deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn rename(
    state: &GenresState,
    id: &str,
    payload: Result<Json<GenrePayload>, JsonRejection>,
    mode: WriteMode,
) -> Result<Json<Genre>, AppError> {
    let id = parse_id(id)?;
    let current = state.repo.get(id).await?;

    let name = json_payload(payload)?.resolve(mode, Some(&current))?;
    if state.repo.name_taken(&name, Some(id)).await? {
        return Err(ValidationErrors::field("name", NAME_TAKEN).into());
    }
    let genre = state.repo.rename(id, &name).await.map_err(name_conflict)?;

    tracing::info!(genre_id = id, ?mode, "genre updated");
    Ok(Json(genre))
}

fn name_conflict(err: StoreError) -> AppError {
    if err.is_unique_violation() {
        ValidationErrors::field("name", NAME_TAKEN).into()
    } else {
        err.into()
    }
}
