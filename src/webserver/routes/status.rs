use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    logger::{self, LogTag},
    push::{connection::ConnectionInfo, metrics::HubMetricsSnapshot},
    webserver::{
        routes::{resolve_user_address, AddressQuery},
        state::AppState,
        utils::success_response,
    },
};

/// Simple health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Push hub introspection
#[derive(Debug, Clone, Serialize)]
pub struct PushStatusResponse {
    pub timestamp: DateTime<Utc>,
    pub hub_running: bool,
    pub active_connections: usize,
    pub connected_users: usize,
    /// Present when the request names a user address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_connections: Option<usize>,
    pub metrics: HubMetricsSnapshot,
    /// The caller's own connections only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<ConnectionInfo>>,
}

/// Create status routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws/status", get(push_status))
}

/// GET /api/health
async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    logger::debug(LogTag::Webserver, "Health check endpoint called");

    let status = if state.hub.is_closed() { "degraded" } else { "ok" };

    success_response(HealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// GET /api/ws/status
async fn push_status(
    Query(query): Query<AddressQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = &state.hub;
    let address = resolve_user_address(&query, &headers).ok();
    let user_connections = address
        .as_deref()
        .map(|address| hub.user_connection_count(address));
    let connections = address.as_deref().map(|address| {
        hub.connections()
            .into_iter()
            .filter(|info| info.user_address == address)
            .collect::<Vec<_>>()
    });

    let response = PushStatusResponse {
        timestamp: Utc::now(),
        hub_running: !hub.is_closed(),
        active_connections: hub.active_connection_count(),
        connected_users: hub.connected_user_count(),
        user_connections,
        metrics: hub.metrics().snapshot(),
        connections,
    };

    logger::debug(
        LogTag::Webserver,
        &format!(
            "Push status ready (connections={}, users={})",
            response.active_connections, response.connected_users
        ),
    );

    success_response(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::TransportKind;
    use crate::webserver::routes::testing::{body_json, test_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_ok() {
        let app = test_app();
        let response = app
            .router
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_push_status_lists_only_own_connections() {
        let app = test_app();
        let _a = app.hub.register("0xabc", TransportKind::Duplex).await.unwrap();
        let _b = app.hub.register("0xabc", TransportKind::Stream).await.unwrap();
        let _c = app.hub.register("0xdef", TransportKind::Stream).await.unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/api/ws/status?address=0xabc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["hub_running"], true);
        assert_eq!(body["active_connections"], 3);
        assert_eq!(body["connected_users"], 2);
        assert_eq!(body["user_connections"], 2);
        assert_eq!(body["metrics"]["total_connections"], 3);

        let own = body["connections"].as_array().unwrap();
        assert_eq!(own.len(), 2);
        assert!(own.iter().all(|c| c["user_address"] == "0xabc"));
        assert!(!body.to_string().contains("0xdef"));
    }

    #[tokio::test]
    async fn test_push_status_without_address_hides_connections() {
        let app = test_app();
        let _a = app.hub.register("0xabc", TransportKind::Duplex).await.unwrap();

        let response = app
            .router
            .clone()
            .oneshot(Request::get("/api/ws/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["active_connections"], 1);
        assert!(body.get("connections").is_none());
        assert!(body.get("user_connections").is_none());
        assert!(!body.to_string().contains("0xabc"));
    }

    #[tokio::test]
    async fn test_push_status_header_scopes_connections() {
        let app = test_app();
        let _a = app.hub.register("0xabc", TransportKind::Duplex).await.unwrap();
        let _b = app.hub.register("0xdef", TransportKind::Stream).await.unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/api/ws/status")
                    .header("X-User-Address", "0xdef")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["user_connections"], 1);
        assert_eq!(body["connections"][0]["user_address"], "0xdef");
        assert!(!body.to_string().contains("0xabc"));
    }

    #[tokio::test]
    async fn test_health_degraded_after_hub_stops() {
        let app = test_app();
        app.shutdown.send(true).unwrap();
        app.hub_task.await.unwrap();

        let response = app
            .router
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
    }
}
