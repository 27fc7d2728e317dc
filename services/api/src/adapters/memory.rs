//! services/api/src/adapters/memory.rs
//!
//! An in-process `RecordStore` backed by `tokio::sync::RwLock` maps. Used when no
//! `DATABASE_URL` is configured, and by the HTTP tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lingo_core::domain::{
    AuthSession, ConversationRecord, NewConversation, User, UserCredentials, VocabularyWord,
    WordProgress,
};
use lingo_core::ports::{PortError, PortResult, RecordStore};
use tokio::sync::RwLock;
use tracing::info;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, String>>,
    sessions: RwLock<HashMap<String, AuthSession>>,
    vocabulary: RwLock<BTreeMap<String, VocabularyWord>>,
    /// user -> word id -> passed
    word_progress: RwLock<HashMap<String, BTreeMap<String, bool>>>,
    conversations: RwLock<Vec<ConversationRecord>>,
    daily: RwLock<HashMap<(NaiveDate, String), bool>>,
    friends: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with the same starter catalogue as the SQL seed migration.
    pub fn with_seed_vocabulary() -> Self {
        let seed = [
            ("apple", "apple", "蘋果"),
            ("airport", "airport", "機場"),
            ("breakfast", "breakfast", "早餐"),
            ("doctor", "doctor", "醫生"),
            ("friend", "friend", "朋友"),
            ("headache", "headache", "頭痛"),
            ("library", "library", "圖書館"),
            ("passport", "passport", "護照"),
            ("restaurant", "restaurant", "餐廳"),
            ("ticket", "ticket", "票"),
            ("umbrella", "umbrella", "雨傘"),
            ("weather", "weather", "天氣"),
        ];
        let vocabulary: BTreeMap<String, VocabularyWord> = seed
            .into_iter()
            .map(|(id, english, chinese)| {
                let word = VocabularyWord {
                    id: id.to_string(),
                    english: english.to_string(),
                    chinese: chinese.to_string(),
                };
                (word.id.clone(), word)
            })
            .collect();
        info!(words = vocabulary.len(), "Seeded in-memory vocabulary");

        Self {
            vocabulary: RwLock::new(vocabulary),
            ..Self::default()
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_user(&self, user_name: &str) -> PortResult<Option<UserCredentials>> {
        Ok(self
            .users
            .read()
            .await
            .get(user_name)
            .map(|hash| UserCredentials {
                user_name: user_name.to_string(),
                password_hash: hash.clone(),
            }))
    }

    async fn create_user(&self, user_name: &str, password_hash: &str) -> PortResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(user_name) {
            return Err(PortError::Conflict(format!("User {} already exists", user_name)));
        }
        users.insert(user_name.to_string(), password_hash.to_string());
        Ok(User {
            user_name: user_name.to_string(),
        })
    }

    async fn user_exists(&self, user_name: &str) -> PortResult<bool> {
        Ok(self.users.read().await.contains_key(user_name))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_name: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.sessions.write().await.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_name: user_name.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String> {
        match self.sessions.read().await.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_name.clone()),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn list_vocabulary(&self) -> PortResult<Vec<VocabularyWord>> {
        Ok(self.vocabulary.read().await.values().cloned().collect())
    }

    async fn list_word_progress(&self, user_name: &str) -> PortResult<Vec<WordProgress>> {
        Ok(self
            .word_progress
            .read()
            .await
            .get(user_name)
            .map(|words| {
                words
                    .iter()
                    .map(|(word_id, passed)| WordProgress {
                        word_id: word_id.clone(),
                        passed: *passed,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_passed_words(&self, user_name: &str) -> PortResult<u32> {
        Ok(self
            .word_progress
            .read()
            .await
            .get(user_name)
            .map(|words| words.values().filter(|passed| **passed).count() as u32)
            .unwrap_or(0))
    }

    async fn upsert_word_progress(
        &self,
        user_name: &str,
        word_id: &str,
        passed: bool,
    ) -> PortResult<()> {
        self.word_progress
            .write()
            .await
            .entry(user_name.to_string())
            .or_default()
            .insert(word_id.to_string(), passed);
        Ok(())
    }

    async fn append_conversation(
        &self,
        conversation: NewConversation,
    ) -> PortResult<ConversationRecord> {
        let record = conversation.into_record(Utc::now());
        self.conversations.write().await.push(record.clone());
        Ok(record)
    }

    async fn count_conversations(&self, user_name: &str) -> PortResult<u32> {
        Ok(self
            .conversations
            .read()
            .await
            .iter()
            .filter(|c| c.user_name == user_name)
            .count() as u32)
    }

    async fn list_conversations(&self, user_name: &str) -> PortResult<Vec<ConversationRecord>> {
        let mut records: Vec<ConversationRecord> = self
            .conversations
            .read()
            .await
            .iter()
            .filter(|c| c.user_name == user_name)
            .cloned()
            .collect();
        // stable sort, so equal timestamps keep append order before the reverse
        records.sort_by_key(|c| c.timestamp);
        records.reverse();
        Ok(records)
    }

    async fn get_daily_completion(
        &self,
        date: NaiveDate,
        user_name: &str,
    ) -> PortResult<Option<bool>> {
        Ok(self
            .daily
            .read()
            .await
            .get(&(date, user_name.to_string()))
            .copied())
    }

    async fn upsert_daily_completion(
        &self,
        date: NaiveDate,
        user_name: &str,
        completed: bool,
    ) -> PortResult<()> {
        self.daily
            .write()
            .await
            .insert((date, user_name.to_string()), completed);
        Ok(())
    }

    async fn get_friend_list(&self, user_name: &str) -> PortResult<Vec<String>> {
        Ok(self
            .friends
            .read()
            .await
            .get(user_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_friend_list(&self, user_name: &str, friends: &[String]) -> PortResult<()> {
        self.friends
            .write()
            .await
            .insert(user_name.to_string(), friends.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_user_conflicts_on_repeat() {
        let store = MemoryStore::new();
        store.create_user("alice", "h").await.unwrap();
        let again = store.create_user("alice", "h").await;
        assert!(matches!(again, Err(PortError::Conflict(_))));
        assert!(store.user_exists("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_rejected() {
        let store = MemoryStore::new();
        store
            .create_auth_session("old", "alice", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        store
            .create_auth_session("new", "alice", Utc::now() + Duration::days(1))
            .await
            .unwrap();

        assert!(matches!(
            store.validate_auth_session("old").await,
            Err(PortError::Unauthorized)
        ));
        assert_eq!(store.validate_auth_session("new").await.unwrap(), "alice");

        store.delete_auth_session("new").await.unwrap();
        assert!(store.validate_auth_session("new").await.is_err());
    }

    #[tokio::test]
    async fn test_conversations_listed_newest_first() {
        let store = MemoryStore::new();
        for input in ["first", "second", "third"] {
            store
                .append_conversation(NewConversation {
                    user_name: "alice".into(),
                    user_input: input.into(),
                    ai_response: "ok".into(),
                    scenario: Some("default".into()),
                })
                .await
                .unwrap();
        }
        let history = store.list_conversations("alice").await.unwrap();
        assert_eq!(history.first().unwrap().user_input, "third");
        assert_eq!(store.count_conversations("alice").await.unwrap(), 3);
        assert_eq!(store.count_conversations("bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seeded_catalogue() {
        let store = MemoryStore::with_seed_vocabulary();
        assert_eq!(store.list_vocabulary().await.unwrap().len(), 12);
    }
}
