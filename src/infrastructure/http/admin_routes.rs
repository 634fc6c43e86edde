//! Admin routes - Emotion commands and state snapshots

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::{AdjustEmotionRequestDto, EmotionsOutcomeDto, OperatorQuery};
use crate::domain::entities::CreatureState;
use crate::infrastructure::http::lifecycle_error;
use crate::infrastructure::state::AppState;

pub async fn adjust_emotions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustEmotionRequestDto>,
) -> Result<Json<EmotionsOutcomeDto>, (StatusCode, String)> {
    state
        .lifecycle_service
        .adjust_emotions(request)
        .await
        .map(Json)
        .map_err(lifecycle_error)
}

pub async fn list_states(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OperatorQuery>,
) -> Result<Json<Vec<CreatureState>>, (StatusCode, String)> {
    state
        .lifecycle_service
        .snapshot(&query.operator)
        .await
        .map(Json)
        .map_err(lifecycle_error)
}
