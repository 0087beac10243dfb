/// Server-Sent Events push endpoint
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::{
    logger::{self, LogTag},
    push::transport::{open_event_stream, run_stream},
    push::TransportKind,
    webserver::{
        routes::{resolve_user_address, AddressQuery},
        state::AppState,
        utils::error_response,
    },
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status-stream", get(status_stream_handler))
}

/// GET /api/status-stream
async fn status_stream_handler(
    Query(query): Query<AddressQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let user_address = match resolve_user_address(&query, &headers) {
        Ok(address) => address,
        Err(response) => return response,
    };

    let registration = match state.hub.register(&user_address, TransportKind::Stream).await {
        Ok(registration) => registration,
        Err(e) => {
            logger::warning(
                LogTag::Stream,
                &format!("Rejecting stream for {}: {}", user_address, e),
            );
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "hub_unavailable",
                &format!("Status push is unavailable: {}", e),
                None,
            );
        }
    };

    let id = registration.id;
    let (body_tx, body) = open_event_stream();
    let task = tokio::spawn(run_stream(
        body_tx,
        registration,
        state.config.stream.clone(),
        state.shutdown.clone(),
    ));

    // A panic drops the registration guard; only the log is left to do here
    tokio::spawn(async move {
        if let Err(e) = task.await {
            logger::error(
                LogTag::Stream,
                &format!("Stream {} task failed: {}", id, e),
            );
        }
    });

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}
