//! HTTP REST API routes

mod admin_routes;
mod catalog_routes;
mod creature_routes;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::application::services::LifecycleError;
use crate::infrastructure::state::AppState;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Creature routes
        .route("/api/turns", post(creature_routes::handle_turn))
        .route("/api/creatures/{user_id}", get(creature_routes::get_status))
        .route(
            "/api/creatures/{user_id}/evolutions",
            get(creature_routes::get_evolution_paths),
        )
        .route(
            "/api/creatures/{user_id}/reset",
            post(creature_routes::reset_creature),
        )
        // Admin routes
        .route("/api/admin/emotions", put(admin_routes::adjust_emotions))
        .route("/api/admin/states", get(admin_routes::list_states))
        // Catalog routes
        .route("/api/catalog", get(catalog_routes::get_catalog))
        .route("/api/catalog/reload", post(catalog_routes::reload_catalog))
}

/// Map a use-case error onto a status code and message
pub(crate) fn lifecycle_error(e: LifecycleError) -> (StatusCode, String) {
    let status = match &e {
        LifecycleError::Forbidden(_) => StatusCode::FORBIDDEN,
        LifecycleError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
        LifecycleError::Store(store) if store.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        LifecycleError::Catalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    }
    (status, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::infrastructure::config::{AppConfig, StoreBackend};

    const CATALOG: &str = r#"[
        {"id": "botamon", "name": "Botamon", "stage": "Baby1",
         "nextEvolutions": [{"targetId": "koromon", "minTurns": 100,
                             "requirements": {"courage": 10}, "description": "first steps"}]},
        {"id": "koromon", "name": "Koromon", "stage": "Baby2"}
    ]"#;

    async fn app() -> Router {
        let path = std::env::temp_dir().join(format!("creatures-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, CATALOG).unwrap();

        let mut config = AppConfig::defaults();
        config.store.backend = StoreBackend::Memory;
        config.catalog.path = path.display().to_string();
        config.admin.whitelist = vec!["9".to_string()];

        let state = AppState::new(config).await.unwrap();
        create_routes().with_state(Arc::new(state))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_turn_then_status_and_evolution() {
        let app = app().await;

        let (status, outcome) = send(
            &app,
            Method::POST,
            "/api/turns",
            Some(json!({"user_id": "1001", "group_id": 5, "turns": 60, "delta": {"courage": 25}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["recorded"], true);
        assert_eq!(outcome["partition"], "1001@g5");
        assert_eq!(outcome["applied_delta"]["courage"], 10);

        let (_, outcome) = send(
            &app,
            Method::POST,
            "/api/turns",
            Some(json!({"user_id": "1001", "group_id": 5, "turns": 40})),
        )
        .await;
        assert_eq!(outcome["evolution"]["new_id"], "koromon");

        let (status, body) = send(&app, Method::GET, "/api/creatures/1001?group_id=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["creature_id"], "koromon");
        assert_eq!(body["turns"], 100);
        assert_eq!(body["balance"], 10);
        assert_eq!(body["stage"], "Baby2");
    }

    #[tokio::test]
    async fn test_paths_reset_and_catalog() {
        let app = app().await;

        let (status, body) =
            send(&app, Method::GET, "/api/creatures/1001/evolutions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["evolutions"][0]["target_id"], "koromon");

        let (_, body) = send(&app, Method::POST, "/api/creatures/1001/reset", None).await;
        assert_eq!(body["reset"], true);
        assert_eq!(body["creature_id"], "botamon");

        let (_, body) = send(&app, Method::GET, "/api/catalog", None).await;
        assert_eq!(body["default_initial"], "botamon");
        assert_eq!(body["creatures"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, Method::GET, "/api/catalog?stage=Baby2", None).await;
        assert_eq!(body["creatures"][0]["id"], "koromon");
        assert_eq!(body["creatures"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::POST, "/api/catalog/reload?operator=1001", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, Method::POST, "/api/catalog/reload?operator=9", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["creature_count"], 2);
    }

    #[tokio::test]
    async fn test_admin_emotions_are_whitelisted() {
        let app = app().await;

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/admin/emotions",
            Some(json!({"operator": "1001", "target": "1001", "mode": "clear"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/admin/emotions",
            Some(json!({"operator": "9", "target": "1001@g2", "mode": "set",
                        "attribute": "friendship", "value": 30})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["emotions"]["friendship"], 30);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/admin/emotions",
            Some(json!({"operator": "9", "target": "", "mode": "clear"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/admin/states?operator=1001", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, "/api/admin/states", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, states) = send(&app, Method::GET, "/api/admin/states?operator=9", None).await;
        assert_eq!(states.as_array().unwrap().len(), 1);
    }
}
