//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the progress, medal, friend, streak, vocabulary
//! and history endpoints, and the master definition for the OpenAPI specification.

use crate::web::state::{AppState, CurrentUser};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, NaiveDate, Utc};
use lingo_core::domain::{FriendBoard, LeaderboardEntry, VocabularyWord, WordProgress};
use lingo_core::medals::{self, Metric};
use lingo_core::streak::{current_streak, date_key, local_today, MAX_WINDOW_DAYS};
use lingo_core::CoreError;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::auth;
use crate::web::chat;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        health_handler,
        progress_handler,
        medals_handler,
        list_friends_handler,
        add_friend_handler,
        streak_handler,
        next_word_handler,
        mark_word_handler,
        conversations_handler,
        chat::scenarios_handler,
        chat::chat_handler,
        chat::quiz_handler,
        chat::score_quiz_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest, auth::LoginRequest, auth::AuthResponse,
            HealthResponse, ProgressResponse, MedalView, MedalsResponse,
            LeaderboardRow, MemberView, FriendBoardResponse, AddFriendRequest,
            StreakDayView, StreakResponse, WordView, NextWordResponse, MarkWordRequest,
            ConversationView,
            chat::ScenarioView, chat::ChatTurnView, chat::ChatRequest, chat::ChatResponse,
            chat::QuizRequest, chat::QuizQuestionView, chat::QuizResponse,
            chat::ScoreQuizRequest, chat::ScoreQuizResponse,
        )
    ),
    tags(
        (name = "Lingo API", description = "Vocabulary, tutor chat, medals, streaks and friend rankings.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Query Parameters
//=========================================================================================

/// The viewer's UTC offset, used to decide which calendar day is "today".
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewerQuery {
    /// Minutes east of UTC (e.g. 480 for Taipei). Server local time when absent.
    pub tz_offset: Option<i32>,
}

impl ViewerQuery {
    pub fn today(&self) -> NaiveDate {
        local_today(self.tz_offset)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreakQuery {
    /// Window length in days, including today.
    pub days: Option<u32>,
    /// Minutes east of UTC.
    pub tz_offset: Option<i32>,
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    ok: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    user_name: String,
    today: String,
    vocab_passed: u32,
    conv_count: u32,
    today_completed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct MedalView {
    id: String,
    label: String,
    description: String,
    /// "vocab" or "conversation"
    metric: String,
    threshold: u32,
    achieved: bool,
}

#[derive(Serialize, ToSchema)]
pub struct MedalsResponse {
    vocab_passed: u32,
    conv_count: u32,
    achieved_count: usize,
    medals: Vec<MedalView>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaderboardRow {
    rank: u32,
    name: String,
    value: u32,
    is_me: bool,
}

#[derive(Serialize, ToSchema)]
pub struct MemberView {
    name: String,
    vocab_passed: u32,
    conv_count: u32,
    medal_count: usize,
    today_completed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct FriendBoardResponse {
    friends: Vec<String>,
    members: Vec<MemberView>,
    vocabulary: Vec<LeaderboardRow>,
    conversations: Vec<LeaderboardRow>,
    medals: Vec<LeaderboardRow>,
}

impl FriendBoardResponse {
    fn from_board(board: FriendBoard, me: &str) -> Self {
        let rows = |entries: Vec<LeaderboardEntry>| -> Vec<LeaderboardRow> {
            entries
                .into_iter()
                .map(|e| LeaderboardRow {
                    rank: e.rank,
                    is_me: e.name == me,
                    name: e.name,
                    value: e.value,
                })
                .collect()
        };
        Self {
            members: board
                .members
                .into_iter()
                .map(|m| MemberView {
                    medal_count: m.medals.len(),
                    name: m.name,
                    vocab_passed: m.progress.vocab_passed,
                    conv_count: m.progress.conv_count,
                    today_completed: m.progress.today_completed,
                })
                .collect(),
            vocabulary: rows(board.vocabulary),
            conversations: rows(board.conversations),
            medals: rows(board.medals),
            friends: board.friends,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AddFriendRequest {
    name: String,
}

#[derive(Serialize, ToSchema)]
pub struct StreakDayView {
    /// `YYYY-MM-DD`
    date: String,
    completed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct StreakResponse {
    today: String,
    days: Vec<StreakDayView>,
    current_streak: u32,
    friends_done_today: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct WordView {
    id: String,
    english: String,
    chinese: String,
}

impl From<VocabularyWord> for WordView {
    fn from(w: VocabularyWord) -> Self {
        Self {
            id: w.id,
            english: w.english,
            chinese: w.chinese,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct NextWordResponse {
    /// `null` once every word has been learned.
    word: Option<WordView>,
    remaining: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkWordRequest {
    passed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ConversationView {
    id: Uuid,
    user_input: String,
    ai_response: String,
    scenario: Option<String>,
    timestamp: DateTime<Utc>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Words the user has not passed yet, in catalogue order.
pub fn unlearned_words(words: Vec<VocabularyWord>, progress: &[WordProgress]) -> Vec<VocabularyWord> {
    let passed: HashSet<&str> = progress
        .iter()
        .filter(|p| p.passed)
        .map(|p| p.word_id.as_str())
        .collect();
    words
        .into_iter()
        .filter(|w| !passed.contains(w.id.as_str()))
        .collect()
}

fn pick_random(words: &[VocabularyWord]) -> Option<VocabularyWord> {
    words.choose(&mut rand::thread_rng()).cloned()
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

#[utoipa::path(get, path = "/health", responses((status = 200, body = HealthResponse)))]
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { ok: true })
}

/// The caller's vocabulary, conversation and daily-challenge progress.
#[utoipa::path(
    get,
    path = "/progress",
    params(ViewerQuery),
    responses(
        (status = 200, description = "Aggregated progress", body = ProgressResponse),
        (status = 401, description = "Not logged in"),
        (status = 503, description = "Record store unavailable")
    )
)]
#[instrument(level = "info", skip(state))]
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = viewer.today();
    let progress = state
        .bounded("load your progress", state.progress.aggregate(&user_name, today))
        .await?;

    Ok(Json(ProgressResponse {
        user_name,
        today: date_key(today),
        vocab_passed: progress.vocab_passed,
        conv_count: progress.conv_count,
        today_completed: progress.today_completed,
    }))
}

/// Every medal with its target and whether the caller has earned it.
#[utoipa::path(
    get,
    path = "/medals",
    params(ViewerQuery),
    responses(
        (status = 200, description = "Medal board", body = MedalsResponse),
        (status = 503, description = "Record store unavailable")
    )
)]
#[instrument(level = "info", skip(state))]
pub async fn medals_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let progress = state
        .bounded("load your medals", state.progress.aggregate(&user_name, viewer.today()))
        .await?;

    let board = medals::medal_board(progress.vocab_passed, progress.conv_count);
    let achieved_count = board.iter().filter(|s| s.achieved).count();
    let medals = board
        .into_iter()
        .map(|s| MedalView {
            id: s.medal.id.to_string(),
            label: s.medal.label.to_string(),
            description: s.medal.description.to_string(),
            metric: match s.medal.metric {
                Metric::Vocabulary => "vocab".to_string(),
                Metric::Conversation => "conversation".to_string(),
            },
            threshold: s.medal.threshold,
            achieved: s.achieved,
        })
        .collect();

    Ok(Json(MedalsResponse {
        vocab_passed: progress.vocab_passed,
        conv_count: progress.conv_count,
        achieved_count,
        medals,
    }))
}

/// The caller's friends and the three leaderboards.
#[utoipa::path(
    get,
    path = "/friends",
    params(ViewerQuery),
    responses(
        (status = 200, description = "Friend leaderboards", body = FriendBoardResponse),
        (status = 503, description = "Record store unavailable")
    )
)]
#[instrument(level = "info", skip(state))]
pub async fn list_friends_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let board = state
        .bounded("load the leaderboards", state.ranking.rank(&user_name, viewer.today()))
        .await?;
    Ok(Json(FriendBoardResponse::from_board(board, &user_name)))
}

/// Adds a registered user to the caller's friend list and returns fresh leaderboards.
#[utoipa::path(
    post,
    path = "/friends",
    params(ViewerQuery),
    request_body = AddFriendRequest,
    responses(
        (status = 200, description = "Friend added", body = FriendBoardResponse),
        (status = 400, description = "Empty name, yourself, already a friend, or no such user"),
        (status = 503, description = "Record store unavailable")
    )
)]
#[instrument(level = "info", skip(state, body))]
pub async fn add_friend_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
    Query(viewer): Query<ViewerQuery>,
    Json(body): Json<AddFriendRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let board = state
        .bounded(
            "add the friend",
            state.ranking.add_friend(&user_name, &body.name, viewer.today()),
        )
        .await?;
    Ok(Json(FriendBoardResponse::from_board(board, &user_name)))
}

/// The trailing daily-challenge calendar.
#[utoipa::path(
    get,
    path = "/streak",
    params(StreakQuery),
    responses(
        (status = 200, description = "Streak calendar", body = StreakResponse),
        (status = 400, description = "Window out of range"),
        (status = 503, description = "Record store unavailable")
    )
)]
#[instrument(level = "info", skip(state))]
pub async fn streak_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
    Query(query): Query<StreakQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let days = query.days.unwrap_or(state.config.streak_window_days);
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("days must be between 1 and {}", MAX_WINDOW_DAYS),
        ));
    }
    let today = local_today(query.tz_offset);

    let (window, friends_done_today) = state
        .bounded("load your streak", async {
            tokio::try_join!(
                state.streak.window(&user_name, today, days),
                state.streak.friends_done_today(&user_name, today)
            )
        })
        .await?;

    Ok(Json(StreakResponse {
        today: date_key(today),
        current_streak: current_streak(&window),
        days: window
            .into_iter()
            .map(|d| StreakDayView {
                date: date_key(d.date),
                completed: d.completed,
            })
            .collect(),
        friends_done_today,
    }))
}

/// A random word the caller has not learned yet.
#[utoipa::path(
    get,
    path = "/vocabulary/next",
    responses(
        (status = 200, description = "Next flashcard, or null when all are learned", body = NextWordResponse),
        (status = 503, description = "Record store unavailable")
    )
)]
#[instrument(level = "info", skip(state))]
pub async fn next_word_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = state.store.clone();
    let (words, progress) = state
        .bounded("load the flashcards", async {
            Ok::<_, CoreError>(tokio::try_join!(
                store.list_vocabulary(),
                store.list_word_progress(&user_name)
            )?)
        })
        .await?;

    let remaining = unlearned_words(words, &progress);
    let word = pick_random(&remaining).map(WordView::from);
    Ok(Json(NextWordResponse {
        word,
        remaining: remaining.len(),
    }))
}

/// Marks a flashcard learned or not learned. Learning a word completes today's challenge.
#[utoipa::path(
    post,
    path = "/vocabulary/{word_id}",
    params(("word_id" = String, Path, description = "Catalogue id of the word"), ViewerQuery),
    request_body = MarkWordRequest,
    responses(
        (status = 204, description = "Recorded"),
        (status = 404, description = "No such word"),
        (status = 503, description = "Record store unavailable")
    )
)]
#[instrument(level = "info", skip(state, body))]
pub async fn mark_word_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
    Path(word_id): Path<String>,
    Query(viewer): Query<ViewerQuery>,
    Json(body): Json<MarkWordRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = viewer.today();
    let known = state
        .bounded("save your answer", async {
            let words = state.store.list_vocabulary().await?;
            if !words.iter().any(|w| w.id == word_id) {
                return Ok::<_, CoreError>(false);
            }
            state
                .progress
                .mark_word(&user_name, &word_id, body.passed, today)
                .await?;
            Ok::<_, CoreError>(true)
        })
        .await?;

    if !known {
        return Err((StatusCode::NOT_FOUND, "No such word.".to_string()));
    }
    info!(%user_name, %word_id, passed = body.passed, "Flashcard marked");
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's chat history, newest first.
#[utoipa::path(
    get,
    path = "/conversations",
    responses(
        (status = 200, description = "Conversation history", body = [ConversationView]),
        (status = 503, description = "Record store unavailable")
    )
)]
#[instrument(level = "info", skip(state))]
pub async fn conversations_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let records = state
        .bounded("load your conversations", async {
            Ok::<_, CoreError>(state.store.list_conversations(&user_name).await?)
        })
        .await?;

    let history: Vec<ConversationView> = records
        .into_iter()
        .map(|r| ConversationView {
            id: r.id,
            user_input: r.user_input,
            ai_response: r.ai_response,
            scenario: r.scenario,
            timestamp: r.timestamp,
        })
        .collect();
    Ok(Json(history))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: &str) -> VocabularyWord {
        VocabularyWord {
            id: id.to_string(),
            english: id.to_string(),
            chinese: "中".to_string(),
        }
    }

    #[test]
    fn test_unlearned_words_skip_only_passed() {
        let words = vec![word("a"), word("b"), word("c")];
        let progress = vec![
            WordProgress { word_id: "a".into(), passed: true },
            WordProgress { word_id: "b".into(), passed: false },
        ];
        let ids: Vec<_> = unlearned_words(words, &progress)
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_pick_random_from_empty() {
        assert!(pick_random(&[]).is_none());
        assert_eq!(pick_random(&[word("x")]).map(|w| w.id), Some("x".to_string()));
    }
}
