//! Catalog routes

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::{CatalogListingDto, CatalogQuery, CatalogReloadDto, OperatorQuery};
use crate::infrastructure::http::lifecycle_error;
use crate::infrastructure::state::AppState;

pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogListingDto> {
    let catalog = state.lifecycle_service.catalog().await;
    Json(CatalogListingDto::new(&catalog, query.stage))
}

pub async fn reload_catalog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OperatorQuery>,
) -> Result<Json<CatalogReloadDto>, (StatusCode, String)> {
    state
        .lifecycle_service
        .reload_catalog(&query.operator)
        .await
        .map(Json)
        .map_err(lifecycle_error)
}
