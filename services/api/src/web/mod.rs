pub mod auth;
pub mod chat;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_auth;

use crate::config::ConfigError;
use crate::error::ApiError;
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application: public auth routes, the session-protected
/// API, CORS, request tracing and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
        })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/progress", get(rest::progress_handler))
        .route("/medals", get(rest::medals_handler))
        .route(
            "/friends",
            get(rest::list_friends_handler).post(rest::add_friend_handler),
        )
        .route("/streak", get(rest::streak_handler))
        .route("/vocabulary/next", get(rest::next_word_handler))
        .route("/vocabulary/{word_id}", post(rest::mark_word_handler))
        .route("/conversations", get(rest::conversations_handler))
        .route("/chat/scenarios", get(chat::scenarios_handler))
        .route("/chat", post(chat::chat_handler))
        .route("/quiz", post(chat::quiz_handler))
        .route("/quiz/score", post(chat::score_quiz_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
