//! crates/lingo_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    ChatTurn, ConversationRecord, NewConversation, User, UserCredentials, VocabularyWord,
    WordProgress,
};
use crate::quiz::{QuizLanguage, QuizQuestion};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item already exists: {0}")]
    Conflict(String),
    #[error("Malformed record: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The persistent document store behind every entity of the application.
///
/// Each method is a typed point lookup, equality query or upsert against one
/// collection. Upserts are last-writer-wins; nothing spans more than one record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // --- Users ---
    async fn get_user(&self, user_name: &str) -> PortResult<Option<UserCredentials>>;

    /// Fails with `PortError::Conflict` when the name is already registered.
    async fn create_user(&self, user_name: &str, password_hash: &str) -> PortResult<User>;

    async fn user_exists(&self, user_name: &str) -> PortResult<bool>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_name: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user name, or `PortError::Unauthorized` for unknown or expired ids.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Vocabulary ---
    async fn list_vocabulary(&self) -> PortResult<Vec<VocabularyWord>>;

    async fn list_word_progress(&self, user_name: &str) -> PortResult<Vec<WordProgress>>;

    async fn count_passed_words(&self, user_name: &str) -> PortResult<u32>;

    async fn upsert_word_progress(
        &self,
        user_name: &str,
        word_id: &str,
        passed: bool,
    ) -> PortResult<()>;

    // --- Conversations ---
    async fn append_conversation(
        &self,
        conversation: NewConversation,
    ) -> PortResult<ConversationRecord>;

    async fn count_conversations(&self, user_name: &str) -> PortResult<u32>;

    /// Newest first.
    async fn list_conversations(&self, user_name: &str) -> PortResult<Vec<ConversationRecord>>;

    // --- Daily Challenge ---
    /// `None` when no record exists for that (date, user) pair.
    async fn get_daily_completion(
        &self,
        date: NaiveDate,
        user_name: &str,
    ) -> PortResult<Option<bool>>;

    async fn upsert_daily_completion(
        &self,
        date: NaiveDate,
        user_name: &str,
        completed: bool,
    ) -> PortResult<()>;

    // --- Friends ---
    /// The stored list as-is; an absent document is an empty list.
    async fn get_friend_list(&self, user_name: &str) -> PortResult<Vec<String>>;

    async fn upsert_friend_list(&self, user_name: &str, friends: &[String]) -> PortResult<()>;
}

#[async_trait]
pub trait TutorService: Send + Sync {
    /// Produces the tutor's next message for a conversation ending in a user turn.
    async fn reply(&self, history: &[ChatTurn]) -> PortResult<String>;
}

#[async_trait]
pub trait QuizGenerationService: Send + Sync {
    /// Generates reading-comprehension questions about an English text.
    async fn generate_quiz(
        &self,
        text: &str,
        language: QuizLanguage,
    ) -> PortResult<Vec<QuizQuestion>>;
}
