//! crates/lingo_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or HTTP serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::medals::MedalSet;

// Represents a registered user - the display name doubles as the login key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_name: String,
}

// Only used internally for login/registration - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_name: String,
    pub password_hash: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_name: String,
    pub expires_at: DateTime<Utc>,
}

/// A global flashcard catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyWord {
    pub id: String,
    pub english: String,
    pub chinese: String,
}

/// The latest learned / not-learned mark a user gave a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordProgress {
    pub word_id: String,
    pub passed: bool,
}

/// One logged chat turn. Append-only.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub user_name: String,
    pub user_input: String,
    pub ai_response: String,
    pub scenario: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A chat turn about to be appended to the conversation log.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub user_name: String,
    pub user_input: String,
    pub ai_response: String,
    pub scenario: Option<String>,
}

impl NewConversation {
    pub fn into_record(self, timestamp: DateTime<Utc>) -> ConversationRecord {
        ConversationRecord {
            id: Uuid::new_v4(),
            user_name: self.user_name,
            user_input: self.user_input,
            ai_response: self.ai_response,
            scenario: self.scenario,
            timestamp,
        }
    }
}

/// Aggregated progress for a single user on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub vocab_passed: u32,
    pub conv_count: u32,
    pub today_completed: bool,
}

/// Progress plus achieved medals for one member of a friend group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProgress {
    pub name: String,
    pub progress: Progress,
    pub medals: MedalSet,
}

/// A single row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub value: u32,
}

/// Everything the friends page shows: the friend list and three leaderboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendBoard {
    pub friends: Vec<String>,
    pub members: Vec<MemberProgress>,
    pub vocabulary: Vec<LeaderboardEntry>,
    pub conversations: Vec<LeaderboardEntry>,
    pub medals: Vec<LeaderboardEntry>,
}

/// One cell of the streak calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakDay {
    pub date: NaiveDate,
    pub completed: bool,
}

/// Who is speaking in a tutor conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single message of a tutor conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}
