//! HTTP event API.
//!
//! Chat platform adapters post normalised events here. Handling runs as a
//! background task so the platform gets its acknowledgement without waiting
//! for commands or digests to finish.

use crate::gateway::Gateway;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use skydigest_cache::constant_time_eq;
use skydigest_core::{config::ApiConfig, message::InboundEvent};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type ApiError = (StatusCode, Json<Value>);

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    gateway: Arc<Gateway>,
    api_key: Option<String>,
}

fn reject(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(json!({"error": msg.into()})))
}

/// Check bearer token auth. Returns `None` if authorized.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Option<ApiError> {
    let key = api_key.as_ref()?;

    let Some(header) = headers.get("authorization") else {
        return Some(reject(
            StatusCode::UNAUTHORIZED,
            "missing Authorization header",
        ));
    };
    let Ok(value) = header.to_str() else {
        return Some(reject(
            StatusCode::UNAUTHORIZED,
            "invalid Authorization header",
        ));
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => None,
        _ => Some(reject(StatusCode::UNAUTHORIZED, "invalid token")),
    }
}

/// `GET /api/health`
async fn health(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ApiError> {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }
    Ok(Json(json!({
        "status": "ok",
        "uptime_secs": state.gateway.uptime_secs(),
    })))
}

/// `POST /api/events`: accept one inbound event, or echo a URL-verification
/// challenge.
async fn events(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }

    let Json(body) =
        body.map_err(|e| reject(StatusCode::BAD_REQUEST, format!("invalid request: {e}")))?;

    if let Some(challenge) = body.get("challenge").and_then(Value::as_str) {
        return Ok(Json(json!({ "challenge": challenge })));
    }

    let event: InboundEvent = serde_json::from_value(body)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("invalid event: {e}")))?;
    if event.event_id.trim().is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "event_id must not be empty"));
    }
    if event.conversation_id.trim().is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "conversation_id must not be empty",
        ));
    }

    let event_id = event.event_id.clone();
    let gw = state.gateway.clone();
    tokio::spawn(async move {
        let id = event.event_id.clone();
        match gw.handle_event(event).await {
            Ok(outcome) => debug!("event {id}: {}", outcome.as_str()),
            Err(e) => warn!("event {id} failed: {e}"),
        }
    });

    Ok(Json(json!({ "status": "accepted", "event_id": event_id })))
}

pub(crate) fn build_router(gateway: Arc<Gateway>, api_key: Option<String>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/events", post(events))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .with_state(ApiState { gateway, api_key })
}

/// Start the API server. Called from `Gateway::run()`.
pub async fn serve(config: ApiConfig, gateway: Arc<Gateway>) {
    let api_key = if config.api_key.is_empty() {
        None
    } else {
        Some(config.api_key.clone())
    };
    let app = build_router(gateway, api_key);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use skydigest_cache::FallbackCache;
    use skydigest_channels::log::LogDelivery;
    use skydigest_core::config::Config;
    use skydigest_core::traits::SharedCache;
    use skydigest_memory::Store;
    use skydigest_providers::degraded::DegradedSummarizer;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn test_gateway(dir: &tempfile::TempDir) -> Arc<Gateway> {
        let mut config = Config::default();
        config.memory.db_path = dir.path().join("api.db").to_string_lossy().into_owned();
        let store = Store::new(&config.memory, config.scheduler.schedule_defaults())
            .await
            .unwrap();
        let cache: Arc<dyn SharedCache> = Arc::new(FallbackCache::local_only());
        Arc::new(Gateway::new(
            &config,
            store,
            cache,
            Arc::new(DegradedSummarizer),
            Arc::new(LogDelivery),
        ))
    }

    async fn body_json(resp: axum::http::Response<Body>) -> Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut req = Request::post(uri).header("Content-Type", "application/json");
        if let Some(t) = token {
            req = req.header("Authorization", format!("Bearer {t}"));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_no_auth() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_gateway(&dir).await, None);
        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_health_requires_token_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_gateway(&dir).await, Some("secret".into()));

        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = Request::get("/api/health")
            .header("Authorization", "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "invalid token");

        let req = Request::get("/api/health")
            .header("Authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_challenge_is_echoed() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_gateway(&dir).await, None);
        let body = json!({"challenge": "abc123", "type": "url_verification"});
        let req = post_json("/api/events", body, None);
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"challenge": "abc123"}));
    }

    #[tokio::test]
    async fn test_event_is_accepted_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let gw = test_gateway(&dir).await;
        let app = build_router(gw.clone(), Some("secret".into()));
        let event = json!({
            "event_id": "evt-42",
            "conversation_id": "c1",
            "sender_id": "u1",
            "text": "ship it",
            "timestamp_ms": 1_741_579_200_000i64,
        });

        let resp = app
            .clone()
            .oneshot(post_json("/api/events", event.clone(), Some("secret")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "accepted");

        // Redelivery is acknowledged too; the gateway drops it.
        let resp = app
            .oneshot(post_json("/api/events", event, Some("secret")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let mut stored = 0;
        for _ in 0..50 {
            stored = gw.store.count_messages("c1").await.unwrap();
            if stored > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(stored, 1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(gw.store.count_messages("c1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_event_rejects_bad_bodies() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_gateway(&dir).await, None);

        let resp = app
            .clone()
            .oneshot(post_json("/api/events", json!({"conversation_id": "c1"}), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/events",
                json!({"event_id": "e1", "conversation_id": "  "}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["error"],
            "conversation_id must not be empty"
        );

        let req = Request::post("/api/events")
            .header("Content-Type", "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_event_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_gateway(&dir).await, Some("secret".into()));
        let req = post_json(
            "/api/events",
            json!({"event_id": "e1", "conversation_id": "c1", "text": "hi"}),
            None,
        );
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
