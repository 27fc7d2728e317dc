//! crates/lingo_core/src/ranking.rs
//!
//! Friend leaderboards. A user's group is themself plus everyone on their
//! friend list; every member is aggregated concurrently and the boards are only
//! built once all of them have answered.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use tracing::{info, instrument};

use crate::domain::{FriendBoard, LeaderboardEntry, MemberProgress};
use crate::error::{CoreError, CoreResult, FriendRejection};
use crate::medals;
use crate::ports::RecordStore;
use crate::progress::ProgressAggregator;

#[derive(Clone)]
pub struct FriendRanking {
    store: Arc<dyn RecordStore>,
    aggregator: ProgressAggregator,
}

impl FriendRanking {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let aggregator = ProgressAggregator::new(store.clone());
        Self { store, aggregator }
    }

    /// The caller's friends, with blanks, self-references and repeats dropped.
    pub async fn friends(&self, user_name: &str) -> CoreResult<Vec<String>> {
        let stored = self.store.get_friend_list(user_name).await?;
        Ok(normalize_friends(user_name, stored))
    }

    /// `user_name` first, then their friends in list order.
    pub async fn group(&self, user_name: &str) -> CoreResult<Vec<String>> {
        let mut group = vec![user_name.to_string()];
        group.extend(self.friends(user_name).await?);
        Ok(group)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn rank(&self, user_name: &str, today: NaiveDate) -> CoreResult<FriendBoard> {
        let friends = self.friends(user_name).await?;

        let group = std::iter::once(user_name.to_string()).chain(friends.iter().cloned());
        let members = try_join_all(group.map(|name| async move {
            let progress = self.aggregator.aggregate(&name, today).await?;
            let medals = medals::evaluate(progress.vocab_passed, progress.conv_count);
            Ok::<_, CoreError>(MemberProgress {
                name,
                progress,
                medals,
            })
        }))
        .await?;

        Ok(build_board(friends, members))
    }

    /// Validates `candidate`, appends it to the caller's list and re-ranks.
    ///
    /// Checks run in the order empty, self, duplicate, not-registered; nothing is
    /// written unless all of them pass.
    #[instrument(level = "info", skip(self))]
    pub async fn add_friend(
        &self,
        user_name: &str,
        candidate: &str,
        today: NaiveDate,
    ) -> CoreResult<FriendBoard> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Err(CoreError::Validation(FriendRejection::Empty));
        }
        if candidate == user_name {
            return Err(CoreError::Validation(FriendRejection::SelfReference));
        }

        let mut stored = self.store.get_friend_list(user_name).await?;
        if stored.iter().any(|f| f == candidate) {
            return Err(CoreError::Validation(FriendRejection::Duplicate));
        }
        if !self.store.user_exists(candidate).await? {
            return Err(CoreError::Validation(FriendRejection::NotFound));
        }

        stored.push(candidate.to_string());
        self.store.upsert_friend_list(user_name, &stored).await?;
        info!(%user_name, %candidate, "friend added");

        self.rank(user_name, today).await
    }
}

pub fn normalize_friends(owner: &str, stored: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(stored.len());
    for name in stored {
        if name.is_empty() || name == owner || out.contains(&name) {
            continue;
        }
        out.push(name);
    }
    out
}

/// Sorts by `metric` descending, ties broken by name ascending, and numbers the rows.
pub fn leaderboard<F>(members: &[MemberProgress], metric: F) -> Vec<LeaderboardEntry>
where
    F: Fn(&MemberProgress) -> u32,
{
    let mut rows: Vec<(u32, &str)> = members
        .iter()
        .map(|m| (metric(m), m.name.as_str()))
        .collect();
    rows.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    rows.into_iter()
        .enumerate()
        .map(|(index, (value, name))| LeaderboardEntry {
            rank: index as u32 + 1,
            name: name.to_string(),
            value,
        })
        .collect()
}

pub fn build_board(friends: Vec<String>, members: Vec<MemberProgress>) -> FriendBoard {
    let vocabulary = leaderboard(&members, |m| m.progress.vocab_passed);
    let conversations = leaderboard(&members, |m| m.progress.conv_count);
    let medals = leaderboard(&members, |m| m.medals.len() as u32);
    FriendBoard {
        friends,
        members,
        vocabulary,
        conversations,
        medals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Progress;

    fn member(name: &str, vocab: u32, conv: u32) -> MemberProgress {
        MemberProgress {
            name: name.to_string(),
            progress: Progress {
                vocab_passed: vocab,
                conv_count: conv,
                today_completed: false,
            },
            medals: medals::evaluate(vocab, conv),
        }
    }

    #[test]
    fn test_normalize_friends_drops_self_blank_and_repeats() {
        let stored = vec![
            "bob".to_string(),
            "alice".to_string(),
            "".to_string(),
            "carol".to_string(),
            "bob".to_string(),
        ];
        assert_eq!(normalize_friends("alice", stored), vec!["bob", "carol"]);
    }

    #[test]
    fn test_ties_break_by_name() {
        let members = vec![member("zoe", 5, 0), member("amy", 5, 0), member("max", 9, 0)];
        let board = leaderboard(&members, |m| m.progress.vocab_passed);
        let names: Vec<_> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["max", "amy", "zoe"]);
        assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_medal_board_counts_medals() {
        let members = vec![member("alice", 12, 55), member("bob", 30, 0)];
        let board = build_board(vec!["bob".to_string()], members);
        assert_eq!(board.medals[0].name, "alice");
        assert_eq!(board.medals[0].value, 3);
        assert_eq!(board.medals[1].value, 2);
        assert_eq!(board.vocabulary[0].name, "bob");
    }
}
