//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request user context.

use crate::config::Config;
use axum::http::StatusCode;
use lingo_core::ports::{QuizGenerationService, RecordStore, TutorService};
use lingo_core::{CoreError, FriendRanking, ProgressAggregator, StreakCalendar};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, warn};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
    /// `None` when no generative API key is configured.
    pub tutor: Option<Arc<dyn TutorService>>,
    pub quiz: Option<Arc<dyn QuizGenerationService>>,
    pub progress: ProgressAggregator,
    pub ranking: FriendRanking,
    pub streak: StreakCalendar,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        config: Arc<Config>,
        tutor: Option<Arc<dyn TutorService>>,
        quiz: Option<Arc<dyn QuizGenerationService>>,
    ) -> Self {
        Self {
            progress: ProgressAggregator::new(store.clone()),
            ranking: FriendRanking::new(store.clone()),
            streak: StreakCalendar::new(store.clone()),
            store,
            config,
            tutor,
            quiz,
        }
    }

    /// Runs a store-backed operation under the configured timeout and maps
    /// failures to the status/message pair handlers return.
    pub async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T, (StatusCode, String)>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(core_error_response(what, e)),
            Err(_) => {
                warn!(%what, timeout = ?self.config.store_timeout, "Record store timed out");
                Err((
                    StatusCode::GATEWAY_TIMEOUT,
                    "The server took too long to respond. Please try again.".to_string(),
                ))
            }
        }
    }
}

//=========================================================================================
// Per-request context
//=========================================================================================

/// The logged-in user's name, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

//=========================================================================================
// Error mapping
//=========================================================================================

pub fn core_error_response(what: &str, e: CoreError) -> (StatusCode, String) {
    match e {
        CoreError::Retrieval(inner) => {
            error!(%what, error = ?inner, "Record store failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to {}. Please try again later.", what),
            )
        }
        CoreError::Validation(reason) => (StatusCode::BAD_REQUEST, friend_rejection_message(reason).to_string()),
        CoreError::NameTaken => (StatusCode::CONFLICT, "That name is already taken.".to_string()),
        CoreError::EmptyName => (StatusCode::BAD_REQUEST, "Please enter a name.".to_string()),
        CoreError::UnknownAccount => (StatusCode::UNAUTHORIZED, "Account not found.".to_string()),
        CoreError::WrongPassword => (StatusCode::UNAUTHORIZED, "Wrong password.".to_string()),
    }
}

pub fn friend_rejection_message(reason: lingo_core::FriendRejection) -> &'static str {
    use lingo_core::FriendRejection::*;
    match reason {
        Empty | SelfReference => "Please enter a valid friend name.",
        Duplicate => "Already on your friend list.",
        NotFound => "No user with that name.",
    }
}
