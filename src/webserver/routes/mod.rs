use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    response::Response,
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::webserver::{state::AppState, utils::error_response};

pub mod status;
pub mod stream;
pub mod ws;

/// Header consulted when the `address` query parameter is absent
pub const USER_ADDRESS_HEADER: &str = "x-user-address";

/// Query parameters shared by the push endpoints
#[derive(Debug, Default, Deserialize)]
pub struct AddressQuery {
    pub address: Option<String>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .merge(ws::routes())
        .nest("/api", api_routes())
        .with_state(state.clone());

    if state.config.webserver.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(ws::routes())
        .merge(stream::routes())
        .merge(status::routes())
}

/// User key for a push connection: query parameter first, then header
pub(crate) fn resolve_user_address(
    query: &AddressQuery,
    headers: &HeaderMap,
) -> Result<String, Response> {
    let from_query = query
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let from_header = || {
        headers
            .get(USER_ADDRESS_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|a| !a.is_empty())
    };

    match from_query.or_else(from_header) {
        Some(address) => Ok(address.to_string()),
        None => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "missing_user_address",
            "User address required: pass ?address= or the X-User-Address header",
            None,
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_query_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ADDRESS_HEADER, HeaderValue::from_static("0xheader"));

        let query = AddressQuery {
            address: Some("0xquery".to_string()),
        };
        assert_eq!(resolve_user_address(&query, &headers).unwrap(), "0xquery");

        let empty = AddressQuery {
            address: Some("  ".to_string()),
        };
        assert_eq!(resolve_user_address(&empty, &headers).unwrap(), "0xheader");
    }

    #[test]
    fn test_missing_address_is_unauthorized() {
        let response = resolve_user_address(&AddressQuery::default(), &HeaderMap::new())
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
