//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `RecordStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lingo_core::domain::{
    ConversationRecord, NewConversation, User, UserCredentials, VocabularyWord, WordProgress,
};
use lingo_core::ports::{PortError, PortResult, RecordStore};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RecordStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// COUNT(*) comes back as BIGINT; anything outside `u32` is a broken row.
fn to_count(raw: i64, what: &str) -> PortResult<u32> {
    u32::try_from(raw).map_err(|_| PortError::Malformed(format!("{} count out of range: {}", what, raw)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_name: String,
    password_hash: String,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_name: self.user_name,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct VocabularyRecord {
    id: String,
    english: String,
    chinese: String,
}
impl VocabularyRecord {
    fn to_domain(self) -> VocabularyWord {
        VocabularyWord {
            id: self.id,
            english: self.english,
            chinese: self.chinese,
        }
    }
}

#[derive(FromRow)]
struct WordProgressRecord {
    word_id: String,
    passed: bool,
}
impl WordProgressRecord {
    fn to_domain(self) -> WordProgress {
        WordProgress {
            word_id: self.word_id,
            passed: self.passed,
        }
    }
}

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    user_name: String,
    user_input: String,
    ai_response: String,
    scenario: Option<String>,
    created_at: DateTime<Utc>,
}
impl ConversationRow {
    fn to_domain(self) -> ConversationRecord {
        ConversationRecord {
            id: self.id,
            user_name: self.user_name,
            user_input: self.user_input,
            ai_response: self.ai_response,
            scenario: self.scenario,
            timestamp: self.created_at,
        }
    }
}

//=========================================================================================
// `RecordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordStore for PgStore {
    async fn get_user(&self, user_name: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_name, password_hash FROM users WHERE user_name = $1",
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn create_user(&self, user_name: &str, password_hash: &str) -> PortResult<User> {
        let inserted = sqlx::query(
            "INSERT INTO users (user_name, password_hash) VALUES ($1, $2) ON CONFLICT (user_name) DO NOTHING",
        )
        .bind(user_name)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if inserted.rows_affected() == 0 {
            return Err(PortError::Conflict(format!("User {} already exists", user_name)));
        }
        Ok(User {
            user_name: user_name.to_string(),
        })
    }

    async fn user_exists(&self, user_name: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE user_name = $1)")
            .bind(user_name)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_name: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_name, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_name)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT user_name FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_vocabulary(&self) -> PortResult<Vec<VocabularyWord>> {
        let records = sqlx::query_as::<_, VocabularyRecord>(
            "SELECT id, english, chinese FROM vocabulary ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_word_progress(&self, user_name: &str) -> PortResult<Vec<WordProgress>> {
        let records = sqlx::query_as::<_, WordProgressRecord>(
            "SELECT word_id, passed FROM user_vocabulary WHERE user_name = $1",
        )
        .bind(user_name)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_passed_words(&self, user_name: &str) -> PortResult<u32> {
        let raw = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_vocabulary WHERE user_name = $1 AND passed = TRUE",
        )
        .bind(user_name)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        to_count(raw, "passed word")
    }

    async fn upsert_word_progress(
        &self,
        user_name: &str,
        word_id: &str,
        passed: bool,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_vocabulary (user_name, word_id, passed) VALUES ($1, $2, $3) \
             ON CONFLICT (user_name, word_id) DO UPDATE SET passed = EXCLUDED.passed",
        )
        .bind(user_name)
        .bind(word_id)
        .bind(passed)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn append_conversation(
        &self,
        conversation: NewConversation,
    ) -> PortResult<ConversationRecord> {
        let record = conversation.into_record(Utc::now());
        sqlx::query(
            "INSERT INTO conversations (id, user_name, user_input, ai_response, scenario, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(&record.user_name)
        .bind(&record.user_input)
        .bind(&record.ai_response)
        .bind(&record.scenario)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record)
    }

    async fn count_conversations(&self, user_name: &str) -> PortResult<u32> {
        let raw = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM conversations WHERE user_name = $1")
            .bind(user_name)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        to_count(raw, "conversation")
    }

    async fn list_conversations(&self, user_name: &str) -> PortResult<Vec<ConversationRecord>> {
        let records = sqlx::query_as::<_, ConversationRow>(
            "SELECT id, user_name, user_input, ai_response, scenario, created_at FROM conversations \
             WHERE user_name = $1 ORDER BY created_at DESC",
        )
        .bind(user_name)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_daily_completion(
        &self,
        date: NaiveDate,
        user_name: &str,
    ) -> PortResult<Option<bool>> {
        sqlx::query_scalar::<_, bool>(
            "SELECT completed FROM daily_challenge WHERE challenge_date = $1 AND user_name = $2",
        )
        .bind(date)
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn upsert_daily_completion(
        &self,
        date: NaiveDate,
        user_name: &str,
        completed: bool,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO daily_challenge (challenge_date, user_name, completed) VALUES ($1, $2, $3) \
             ON CONFLICT (challenge_date, user_name) DO UPDATE SET completed = EXCLUDED.completed",
        )
        .bind(date)
        .bind(user_name)
        .bind(completed)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_friend_list(&self, user_name: &str) -> PortResult<Vec<String>> {
        let friends = sqlx::query_scalar::<_, Vec<String>>(
            "SELECT friends FROM friend_lists WHERE user_name = $1",
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(friends.unwrap_or_default())
    }

    async fn upsert_friend_list(&self, user_name: &str, friends: &[String]) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO friend_lists (user_name, friends) VALUES ($1, $2) \
             ON CONFLICT (user_name) DO UPDATE SET friends = EXCLUDED.friends",
        )
        .bind(user_name)
        .bind(friends)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}
