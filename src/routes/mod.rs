/// Application routes configuration
use crate::handlers::{
    acquire_imagery, cache_stats, clear_cache, export_current, get_state, health, run_analysis,
    set_body, AppState,
};
use axum::{
    routing::{get, post},
    Router,
};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // View state
        .route("/state", get(get_state))
        .route("/body", post(set_body))
        .route("/imagery", post(acquire_imagery))
        .route("/analysis", post(run_analysis))
        .route("/export", get(export_current))
        // Cache
        .route("/cache", get(cache_stats))
        .route("/cache/clear", post(clear_cache))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::scripted::ScriptedTransport;
    use crate::coordinator::ViewCoordinator;
    use crate::domain::CelestialBody;
    use crate::services::tests::test_config;
    use crate::services::DataFacade;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let facade = Arc::new(DataFacade::new(
            &test_config(),
            Arc::new(ScriptedTransport::failing()),
        ));
        let coordinator = Arc::new(ViewCoordinator::new(facade.clone(), CelestialBody::Earth));
        build_router(AppState {
            facade,
            coordinator,
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let resp = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_acquire_then_export_geojson() {
        let app = app();

        let resp = app
            .clone()
            .oneshot(post_json("/imagery", json!({"latitude": 10.0, "longitude": 20.0})))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["phase"], "ready");
        assert_eq!(body["imagery"].as_array().unwrap().len(), 1);
        assert!(body["notice"].is_string());

        let resp = app
            .clone()
            .oneshot(get("/export?format=geojson"))
            .await
            .unwrap();
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/geo+json"
        );
        assert!(resp.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"satellitepro-imagery-"));
        let doc = json_body(resp).await;
        assert_eq!(doc["features"][0]["geometry"]["coordinates"], json!([20.0, 10.0]));
    }

    #[tokio::test]
    async fn test_invalid_latitude_uses_error_envelope() {
        let resp = app()
            .oneshot(post_json("/imagery", json!({"latitude": 95.0, "longitude": 20.0})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_unknown_analysis_kind_rejected() {
        let resp = app()
            .oneshot(post_json(
                "/analysis",
                json!({"kind": "radar", "latitude": 1.0, "longitude": 2.0}),
            ))
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_body_switch_and_cache_clear() {
        let app = app();
        app.clone()
            .oneshot(post_json("/imagery", json!({"latitude": 1.0, "longitude": 2.0})))
            .await
            .unwrap();

        let body = json_body(
            app.clone()
                .oneshot(post_json("/body", json!({"body": "mars"})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["body"], "mars");
        assert_eq!(body["phase"], "idle");
        assert_eq!(body["imagery"], json!([]));

        let stats = json_body(app.clone().oneshot(get("/cache")).await.unwrap()).await;
        assert_eq!(stats["entries"], 1);

        let cleared = json_body(
            app.clone()
                .oneshot(post_json("/cache/clear", json!({})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(cleared["dropped"], 1);
    }

    #[tokio::test]
    async fn test_export_unknown_format() {
        let body = json_body(app().oneshot(get("/export?format=xml")).await.unwrap()).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_export_unknown_subject() {
        let response = app()
            .oneshot(get("/export?format=csv&subject=weather"))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("unknown export subject"));
    }
}
