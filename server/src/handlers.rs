//! Route handlers. Each one delegates to the upstream client or the
//! character repository and lets `ApiError` pick the status code.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use characters_core::{Character, CharacterFilter, CharacterPatch, DeleteResult, Info, Location};

use crate::error::ApiError;
use crate::AppState;

pub async fn health() -> &'static str {
    "OK"
}

/// GET /characters/external?page=&name=&status=&species=&type=&gender=
pub async fn external_characters(
    State(state): State<AppState>,
    Query(filter): Query<CharacterFilter>,
) -> Result<Json<Info<Character>>, ApiError> {
    tracing::info!(?filter, "external character search");
    let page = state
        .upstream
        .fetch_characters(&*state.transport, &filter)
        .await?;
    Ok(Json(page))
}

/// GET /characters/locations
pub async fn locations(State(state): State<AppState>) -> Result<Json<Info<Location>>, ApiError> {
    tracing::info!("external location listing");
    let page = state.upstream.fetch_locations(&*state.transport).await?;
    Ok(Json(page))
}

pub async fn create_character(
    State(state): State<AppState>,
    Json(patch): Json<CharacterPatch>,
) -> Result<(StatusCode, Json<Character>), ApiError> {
    let character = state.characters.create(patch).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

pub async fn list_characters(State(state): State<AppState>) -> Result<Json<Vec<Character>>, ApiError> {
    Ok(Json(state.characters.get_all().await?))
}

pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Character>, ApiError> {
    Ok(Json(state.characters.get_by_id(&id).await?))
}

pub async fn update_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CharacterPatch>,
) -> Result<Json<Character>, ApiError> {
    Ok(Json(state.characters.update(&id, patch).await?))
}

pub async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    Ok(Json(state.characters.delete(&id).await?))
}
