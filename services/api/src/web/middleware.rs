//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use lingo_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::auth::session_id_from_headers;
use crate::web::state::{AppState, CurrentUser};

/// Middleware that validates the auth session cookie and resolves the user name.
///
/// If valid, inserts `CurrentUser` into request extensions for handlers to use.
/// A missing, unknown or expired session is 401. A failing store is 503 and a
/// store that does not answer within `store_timeout` is 504; the cookie stays valid.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Parse session ID from the cookie header
    let auth_session_id = session_id_from_headers(req.headers())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    // 2. Validate auth session in the store, get the user name
    let validated = tokio::time::timeout(
        state.config.store_timeout,
        state.store.validate_auth_session(&auth_session_id),
    )
    .await
    .map_err(|_| {
        warn!(timeout = ?state.config.store_timeout, "Auth session lookup timed out");
        StatusCode::GATEWAY_TIMEOUT
    })?;

    let user_name = match validated {
        Ok(user_name) => user_name,
        Err(PortError::Unauthorized) => return Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            error!("Failed to validate auth session: {:?}", e);
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    };

    // 3. Insert the user into request extensions and continue to the handler
    req.extensions_mut().insert(CurrentUser(user_name));
    Ok(next.run(req).await)
}
