//! services/api/src/web/chat.rs
//!
//! Handlers backed by the generative model: the role-play tutor and the
//! reading-quiz generator, plus quiz scoring.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use lingo_core::domain::{ChatRole, ChatTurn, NewConversation};
use lingo_core::quiz::{self, QuestionType, QuizLanguage, QuizQuestion};
use lingo_core::scenarios::{find_scenario, DEFAULT_SCENARIO, SCENARIOS};
use lingo_core::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::web::state::{AppState, CurrentUser};

const AI_FAILURE: &str = "Sorry, the AI service failed.";
const AI_DISABLED: &str = "The AI service is not configured.";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ScenarioView {
    key: String,
    label: String,
    opening: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurnView {
    /// "user" or "assistant"
    role: String,
    content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Scenario key; "default" when absent.
    #[serde(default)]
    scenario: Option<String>,
    /// Earlier turns of this chat, oldest first. The scenario opening is added when empty.
    #[serde(default)]
    history: Vec<ChatTurnView>,
    input: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    reply: String,
    history: Vec<ChatTurnView>,
}

#[derive(Deserialize, ToSchema)]
pub struct QuizRequest {
    text: String,
    /// "chinese" (default) or "english"
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestionView {
    /// vocabulary_mcq, comprehension_mcq or fill_in_the_blank
    question_type: String,
    question_text: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    answer: String,
    explanation: String,
}

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    questions: Vec<QuizQuestionView>,
}

#[derive(Deserialize, ToSchema)]
pub struct ScoreQuizRequest {
    questions: Vec<QuizQuestionView>,
    /// Answers keyed by question index.
    answers: HashMap<usize, String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScoreQuizResponse {
    correct: usize,
    total: usize,
}

//=========================================================================================
// Conversions
//=========================================================================================

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

impl From<&ChatTurn> for ChatTurnView {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: role_name(turn.role).to_string(),
            content: turn.content.clone(),
        }
    }
}

impl TryFrom<ChatTurnView> for ChatTurn {
    type Error = String;

    fn try_from(view: ChatTurnView) -> Result<Self, Self::Error> {
        let role = match view.role.as_str() {
            "user" => ChatRole::User,
            "assistant" => ChatRole::Assistant,
            other => return Err(format!("Unknown chat role '{}'.", other)),
        };
        Ok(ChatTurn {
            role,
            content: view.content,
        })
    }
}

fn question_type_name(kind: QuestionType) -> &'static str {
    match kind {
        QuestionType::VocabularyMcq => "vocabulary_mcq",
        QuestionType::ComprehensionMcq => "comprehension_mcq",
        QuestionType::FillInTheBlank => "fill_in_the_blank",
    }
}

fn parse_question_type(name: &str) -> Option<QuestionType> {
    match name {
        "vocabulary_mcq" => Some(QuestionType::VocabularyMcq),
        "comprehension_mcq" => Some(QuestionType::ComprehensionMcq),
        "fill_in_the_blank" => Some(QuestionType::FillInTheBlank),
        _ => None,
    }
}

impl From<QuizQuestion> for QuizQuestionView {
    fn from(q: QuizQuestion) -> Self {
        Self {
            question_type: question_type_name(q.question_type).to_string(),
            question_text: q.question_text,
            options: q.options,
            answer: q.answer,
            explanation: q.explanation,
        }
    }
}

impl TryFrom<QuizQuestionView> for QuizQuestion {
    type Error = String;

    fn try_from(view: QuizQuestionView) -> Result<Self, Self::Error> {
        let question_type = parse_question_type(&view.question_type)
            .ok_or_else(|| format!("Unknown question type '{}'.", view.question_type))?;
        Ok(QuizQuestion {
            question_type,
            question_text: view.question_text,
            options: view.options,
            answer: view.answer,
            explanation: view.explanation,
        })
    }
}

fn parse_language(raw: Option<&str>) -> Result<QuizLanguage, String> {
    match raw.map(str::trim) {
        None | Some("") | Some("chinese") | Some("zh") => Ok(QuizLanguage::Chinese),
        Some("english") | Some("en") => Ok(QuizLanguage::English),
        Some(other) => Err(format!("Unsupported quiz language '{}'.", other)),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/chat/scenarios",
    responses((status = 200, description = "Available role-play scenarios", body = [ScenarioView]))
)]
pub async fn scenarios_handler() -> impl IntoResponse {
    let scenarios: Vec<ScenarioView> = SCENARIOS
        .iter()
        .map(|s| ScenarioView {
            key: s.key.to_string(),
            label: s.label.to_string(),
            opening: s.opening.to_string(),
        })
        .collect();
    Json(scenarios)
}

/// Sends one learner turn to the tutor. Only successful turns are recorded.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Tutor reply", body = ChatResponse),
        (status = 400, description = "Empty input, unknown scenario or malformed history"),
        (status = 502, description = "The AI service failed"),
        (status = 503, description = "AI not configured or record store unavailable")
    )
)]
#[instrument(level = "info", skip(state, req))]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let input = req.input.trim().to_string();
    if input.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Please enter a message.".to_string()));
    }

    let key = req.scenario.as_deref().unwrap_or(DEFAULT_SCENARIO);
    let scenario = find_scenario(key)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown scenario '{}'.", key)))?;

    let tutor = state
        .tutor
        .clone()
        .ok_or((StatusCode::SERVICE_UNAVAILABLE, AI_DISABLED.to_string()))?;

    // 1. Rebuild the conversation, opening with the scenario's line
    let mut turns = Vec::with_capacity(req.history.len() + 2);
    if req.history.is_empty() {
        turns.push(scenario.opening_turn());
    }
    for view in req.history {
        turns.push(ChatTurn::try_from(view).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?);
    }
    turns.push(ChatTurn {
        role: ChatRole::User,
        content: input.clone(),
    });

    // 2. Ask the tutor
    let reply = tutor.reply(&turns).await.map_err(|e| {
        error!(user_name = %user_name, scenario = scenario.key, "Tutor failed: {:?}", e);
        (StatusCode::BAD_GATEWAY, AI_FAILURE.to_string())
    })?;

    // 3. Record the turn. Failed replies never reach this point, so they do
    // not count towards `conv_count`.
    let record = NewConversation {
        user_name: user_name.clone(),
        user_input: input,
        ai_response: reply.clone(),
        scenario: Some(scenario.key.to_string()),
    };
    state
        .bounded("save the conversation", async {
            state
                .store
                .append_conversation(record)
                .await
                .map_err(CoreError::from)
        })
        .await?;
    info!(user_name = %user_name, scenario = scenario.key, "Chat turn recorded");

    turns.push(ChatTurn {
        role: ChatRole::Assistant,
        content: reply.clone(),
    });
    Ok(Json(ChatResponse {
        reply,
        history: turns.iter().map(ChatTurnView::from).collect(),
    }))
}

/// Generates reading-comprehension questions about a text.
#[utoipa::path(
    post,
    path = "/quiz",
    request_body = QuizRequest,
    responses(
        (status = 200, description = "Generated questions", body = QuizResponse),
        (status = 400, description = "Empty text or unsupported language"),
        (status = 502, description = "The AI service failed"),
        (status = 503, description = "AI not configured")
    )
)]
#[instrument(level = "info", skip(state, req))]
pub async fn quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_name)): Extension<CurrentUser>,
    Json(req): Json<QuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Please enter some text.".to_string()));
    }
    let language =
        parse_language(req.language.as_deref()).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let generator = state
        .quiz
        .clone()
        .ok_or((StatusCode::SERVICE_UNAVAILABLE, AI_DISABLED.to_string()))?;

    let questions = generator.generate_quiz(text, language).await.map_err(|e| {
        error!(user_name = %user_name, "Quiz generation failed: {:?}", e);
        (StatusCode::BAD_GATEWAY, AI_FAILURE.to_string())
    })?;

    info!(user_name = %user_name, count = questions.len(), "Quiz generated");
    Ok(Json(QuizResponse {
        questions: questions.into_iter().map(QuizQuestionView::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/quiz/score",
    request_body = ScoreQuizRequest,
    responses(
        (status = 200, description = "Exact-match score", body = ScoreQuizResponse),
        (status = 400, description = "Malformed questions")
    )
)]
pub async fn score_quiz_handler(
    Json(req): Json<ScoreQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let questions = req
        .questions
        .into_iter()
        .map(QuizQuestion::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let result = quiz::score(&questions, &req.answers);
    Ok(Json(ScoreQuizResponse {
        correct: result.correct,
        total: result.total,
    }))
}
