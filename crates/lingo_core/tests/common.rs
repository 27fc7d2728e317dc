#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lingo_core::{
    ConversationRecord, NewConversation, PortError, PortResult, RecordStore, User,
    UserCredentials, VocabularyWord, WordProgress,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// An in-memory record store with hooks for failure injection and write counting.
#[derive(Default)]
pub struct FakeStore {
    users: Mutex<HashMap<String, String>>,
    words: Mutex<HashMap<String, BTreeMap<String, bool>>>,
    conversations: Mutex<Vec<ConversationRecord>>,
    daily: Mutex<HashMap<(NaiveDate, String), bool>>,
    friends: Mutex<HashMap<String, Vec<String>>>,
    failing_users: Mutex<HashSet<String>>,
    friend_writes: Mutex<usize>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, name: &str) {
        self.users
            .lock()
            .unwrap()
            .insert(name.to_string(), "hash".to_string());
    }

    pub fn set_passed_words(&self, name: &str, count: usize) {
        let mut words = self.words.lock().unwrap();
        let entry = words.entry(name.to_string()).or_default();
        for i in 0..count {
            entry.insert(format!("w{i}"), true);
        }
    }

    pub fn add_conversations(&self, name: &str, count: usize) {
        let mut log = self.conversations.lock().unwrap();
        for i in 0..count {
            log.push(
                NewConversation {
                    user_name: name.to_string(),
                    user_input: format!("hello {i}"),
                    ai_response: "hi".to_string(),
                    scenario: None,
                }
                .into_record(Utc::now()),
            );
        }
    }

    pub fn complete_day(&self, name: &str, date: NaiveDate) {
        self.daily
            .lock()
            .unwrap()
            .insert((date, name.to_string()), true);
    }

    pub fn set_friends(&self, name: &str, friends: &[&str]) {
        self.friends.lock().unwrap().insert(
            name.to_string(),
            friends.iter().map(|f| f.to_string()).collect(),
        );
    }

    pub fn stored_friends(&self, name: &str) -> Vec<String> {
        self.friends
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Every read for `name` fails from now on.
    pub fn fail_reads_for(&self, name: &str) {
        self.failing_users.lock().unwrap().insert(name.to_string());
    }

    pub fn friend_writes(&self) -> usize {
        *self.friend_writes.lock().unwrap()
    }

    fn check(&self, name: &str) -> PortResult<()> {
        if self.failing_users.lock().unwrap().contains(name) {
            return Err(PortError::Unexpected(format!("store unreachable for {name}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn get_user(&self, user_name: &str) -> PortResult<Option<UserCredentials>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(user_name)
            .map(|hash| UserCredentials {
                user_name: user_name.to_string(),
                password_hash: hash.clone(),
            }))
    }

    async fn create_user(&self, user_name: &str, password_hash: &str) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(user_name) {
            return Err(PortError::Conflict(user_name.to_string()));
        }
        users.insert(user_name.to_string(), password_hash.to_string());
        Ok(User {
            user_name: user_name.to_string(),
        })
    }

    async fn user_exists(&self, user_name: &str) -> PortResult<bool> {
        Ok(self.users.lock().unwrap().contains_key(user_name))
    }

    async fn create_auth_session(
        &self,
        _session_id: &str,
        _user_name: &str,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        Ok(())
    }

    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<String> {
        Err(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        Ok(())
    }

    async fn list_vocabulary(&self) -> PortResult<Vec<VocabularyWord>> {
        Ok(Vec::new())
    }

    async fn list_word_progress(&self, user_name: &str) -> PortResult<Vec<WordProgress>> {
        self.check(user_name)?;
        Ok(self
            .words
            .lock()
            .unwrap()
            .get(user_name)
            .map(|words| {
                words
                    .iter()
                    .map(|(id, passed)| WordProgress {
                        word_id: id.clone(),
                        passed: *passed,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_passed_words(&self, user_name: &str) -> PortResult<u32> {
        self.check(user_name)?;
        Ok(self
            .words
            .lock()
            .unwrap()
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
        self.words
            .lock()
            .unwrap()
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
        self.conversations.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn count_conversations(&self, user_name: &str) -> PortResult<u32> {
        self.check(user_name)?;
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_name == user_name)
            .count() as u32)
    }

    async fn list_conversations(&self, user_name: &str) -> PortResult<Vec<ConversationRecord>> {
        self.check(user_name)?;
        let mut records: Vec<_> = self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_name == user_name)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }

    async fn get_daily_completion(
        &self,
        date: NaiveDate,
        user_name: &str,
    ) -> PortResult<Option<bool>> {
        self.check(user_name)?;
        Ok(self
            .daily
            .lock()
            .unwrap()
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
            .lock()
            .unwrap()
            .insert((date, user_name.to_string()), completed);
        Ok(())
    }

    async fn get_friend_list(&self, user_name: &str) -> PortResult<Vec<String>> {
        self.check(user_name)?;
        Ok(self.stored_friends(user_name))
    }

    async fn upsert_friend_list(&self, user_name: &str, friends: &[String]) -> PortResult<()> {
        *self.friend_writes.lock().unwrap() += 1;
        self.friends
            .lock()
            .unwrap()
            .insert(user_name.to_string(), friends.to_vec());
        Ok(())
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
