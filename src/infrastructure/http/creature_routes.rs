//! Creature routes - Turns, status, evolution paths and reset

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::{
    CreatureStatusDto, EvolutionPathsDto, PartitionQuery, ResetOutcomeDto, TurnOutcomeDto,
    TurnRequestDto,
};
use crate::infrastructure::http::lifecycle_error;
use crate::infrastructure::state::AppState;

/// Record one chat turn; store trouble shows up as `recorded: false`
pub async fn handle_turn(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TurnRequestDto>,
) -> Result<Json<TurnOutcomeDto>, (StatusCode, String)> {
    if request.user_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "user_id cannot be empty".to_string()));
    }
    Ok(Json(state.lifecycle_service.handle_turn(request).await))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<PartitionQuery>,
) -> Result<Json<CreatureStatusDto>, (StatusCode, String)> {
    state
        .lifecycle_service
        .status(&user_id, query.group_id)
        .await
        .map(Json)
        .map_err(lifecycle_error)
}

pub async fn get_evolution_paths(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<PartitionQuery>,
) -> Result<Json<EvolutionPathsDto>, (StatusCode, String)> {
    state
        .lifecycle_service
        .evolution_paths(&user_id, query.group_id)
        .await
        .map(Json)
        .map_err(lifecycle_error)
}

pub async fn reset_creature(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<PartitionQuery>,
) -> Json<ResetOutcomeDto> {
    Json(state.lifecycle_service.reset(&user_id, query.group_id).await)
}
