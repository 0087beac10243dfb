/// WebSocket push endpoint
///
/// Upgrades the request and hands the socket to the duplex transport, keyed
/// by the caller's user address.
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::{
    logger::{self, LogTag},
    push::transport::{serve_websocket, MAX_INBOUND_MESSAGE_SIZE},
    webserver::{
        routes::{resolve_user_address, AddressQuery},
        state::AppState,
        utils::error_response,
    },
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}

/// GET /ws and /api/ws
async fn ws_handler(
    ws: Option<WebSocketUpgrade>,
    Query(query): Query<AddressQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let user_address = match resolve_user_address(&query, &headers) {
        Ok(address) => address,
        Err(response) => return response,
    };

    let Some(ws) = ws else {
        return error_response(
            StatusCode::UPGRADE_REQUIRED,
            "websocket_upgrade_required",
            "This endpoint only accepts WebSocket upgrade requests",
            None,
        );
    };

    logger::debug(
        LogTag::Webserver,
        &format!("WebSocket upgrade requested by {}", user_address),
    );

    let hub = state.hub.clone();
    let config = state.config.websocket.clone();
    let failed_for = user_address.clone();

    ws.max_message_size(MAX_INBOUND_MESSAGE_SIZE)
        .on_failed_upgrade(move |e| {
            logger::warning(
                LogTag::Websocket,
                &format!("WebSocket upgrade failed for {}: {}", failed_for, e),
            );
        })
        .on_upgrade(move |socket| serve_websocket(socket, hub, user_address, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webserver::routes::testing::{body_json, test_app};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_rejects_missing_address() {
        let app = test_app();
        for path in ["/ws", "/api/ws"] {
            let response = app
                .router
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert_eq!(body["error"]["code"], "missing_user_address");
        }
        assert_eq!(app.hub.active_connection_count(), 0);
    }

    #[tokio::test]
    async fn test_plain_request_needs_upgrade() {
        let app = test_app();
        let response = app
            .router
            .oneshot(
                Request::get("/api/ws?address=0xabc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
    }
}
