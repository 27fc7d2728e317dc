mod common;

use common::*;
use lingo_core::{
    accounts, medals, CoreError, FriendRanking, FriendRejection, ProgressAggregator, RecordStore,
    StreakCalendar,
};
use std::sync::Arc;

#[tokio::test]
async fn test_marking_same_word_twice_counts_once() {
    let store = FakeStore::new();
    let aggregator = ProgressAggregator::new(store.clone());
    let today = day(2024, 6, 1);

    aggregator.mark_word("alice", "w1", true, today).await.unwrap();
    aggregator.mark_word("alice", "w1", true, today).await.unwrap();

    let progress = aggregator.aggregate("alice", today).await.unwrap();
    assert_eq!(progress.vocab_passed, 1);
    assert!(progress.today_completed);
}

#[tokio::test]
async fn test_failing_a_word_does_not_complete_the_day() {
    let store = FakeStore::new();
    let aggregator = ProgressAggregator::new(store.clone());
    let today = day(2024, 6, 1);

    aggregator.mark_word("alice", "w1", false, today).await.unwrap();

    let progress = aggregator.aggregate("alice", today).await.unwrap();
    assert_eq!(progress.vocab_passed, 0);
    assert!(!progress.today_completed);
    assert_eq!(store.get_daily_completion(today, "alice").await.unwrap(), None);
}

#[tokio::test]
async fn test_unlearning_a_word_lowers_the_count() {
    let store = FakeStore::new();
    let aggregator = ProgressAggregator::new(store.clone());
    let today = day(2024, 6, 1);

    aggregator.mark_word("alice", "w1", true, today).await.unwrap();
    aggregator.mark_word("alice", "w1", false, today).await.unwrap();

    let progress = aggregator.aggregate("alice", today).await.unwrap();
    assert_eq!(progress.vocab_passed, 0);
    // the day stays completed; nothing takes it back
    assert!(progress.today_completed);
}

#[tokio::test]
async fn test_conversation_count_is_exact_name_match() {
    let store = FakeStore::new();
    store.add_conversations("alice", 3);
    store.add_conversations("Alice", 2);
    store.add_conversations("alice ", 1);

    let aggregator = ProgressAggregator::new(store.clone());
    let progress = aggregator.aggregate("alice", day(2024, 6, 1)).await.unwrap();
    assert_eq!(progress.conv_count, 3);
}

#[tokio::test]
async fn test_unreachable_store_is_not_zero() {
    let store = FakeStore::new();
    store.fail_reads_for("alice");

    let aggregator = ProgressAggregator::new(store.clone());
    let result = aggregator.aggregate("alice", day(2024, 6, 1)).await;
    assert!(matches!(result, Err(CoreError::Retrieval(_))));
}

#[tokio::test]
async fn test_alice_and_bob_scenario() {
    let store = FakeStore::new();
    store.add_user("alice");
    store.add_user("bob");
    store.set_passed_words("alice", 12);
    store.add_conversations("alice", 55);
    store.set_passed_words("bob", 5);
    store.set_friends("alice", &["bob"]);

    let aggregator = ProgressAggregator::new(store.clone());
    let today = day(2024, 6, 1);
    let progress = aggregator.aggregate("alice", today).await.unwrap();
    assert_eq!(progress.vocab_passed, 12);
    assert_eq!(progress.conv_count, 55);

    let achieved = medals::evaluate(progress.vocab_passed, progress.conv_count);
    assert_eq!(
        achieved.into_iter().collect::<Vec<_>>(),
        vec!["conv10", "conv50", "vocab10"]
    );

    let board = FriendRanking::new(store.clone()).rank("alice", today).await.unwrap();
    assert_eq!(board.vocabulary[0].name, "alice");
    assert_eq!(board.vocabulary[0].value, 12);
    assert_eq!(board.vocabulary[1].name, "bob");
    assert_eq!(board.medals[0].name, "alice");
    assert_eq!(board.medals[0].value, 3);
}

#[tokio::test]
async fn test_ranking_is_stable_across_runs() {
    let store = FakeStore::new();
    for name in ["dan", "alice", "carol", "bob"] {
        store.add_user(name);
        store.set_passed_words(name, 4);
    }
    store.set_friends("dan", &["carol", "bob", "alice"]);

    let ranking = FriendRanking::new(store.clone());
    let today = day(2024, 6, 1);
    let first = ranking.rank("dan", today).await.unwrap();
    for _ in 0..5 {
        assert_eq!(ranking.rank("dan", today).await.unwrap(), first);
    }
    let names: Vec<_> = first.vocabulary.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob", "carol", "dan"]);
}

#[tokio::test]
async fn test_ranking_ignores_self_and_repeated_friends_in_storage() {
    let store = FakeStore::new();
    store.set_friends("alice", &["bob", "alice", "bob"]);

    let board = FriendRanking::new(store.clone())
        .rank("alice", day(2024, 6, 1))
        .await
        .unwrap();
    assert_eq!(board.friends, vec!["bob"]);
    assert_eq!(board.members.len(), 2);
}

#[tokio::test]
async fn test_ranking_fails_when_any_member_fails() {
    let store = FakeStore::new();
    store.set_friends("alice", &["bob", "carol"]);
    store.fail_reads_for("carol");

    let result = FriendRanking::new(store.clone())
        .rank("alice", day(2024, 6, 1))
        .await;
    assert!(matches!(result, Err(CoreError::Retrieval(_))));
}

#[tokio::test]
async fn test_add_friend_rejections_leave_list_unchanged() {
    let store = FakeStore::new();
    store.add_user("alice");
    store.add_user("bob");
    store.set_friends("alice", &["bob"]);

    let ranking = FriendRanking::new(store.clone());
    let today = day(2024, 6, 1);

    let cases = [
        ("", FriendRejection::Empty),
        ("   ", FriendRejection::Empty),
        ("alice", FriendRejection::SelfReference),
        (" alice ", FriendRejection::SelfReference),
        ("bob", FriendRejection::Duplicate),
        ("mallory", FriendRejection::NotFound),
    ];
    for (candidate, reason) in cases {
        match ranking.add_friend("alice", candidate, today).await {
            Err(CoreError::Validation(got)) => assert_eq!(got, reason, "{candidate:?}"),
            other => panic!("expected rejection for {candidate:?}, got {other:?}"),
        }
        assert_eq!(store.stored_friends("alice"), vec!["bob"]);
    }
    assert_eq!(store.friend_writes(), 0);
}

#[tokio::test]
async fn test_add_friend_writes_once_and_reranks() {
    let store = FakeStore::new();
    store.add_user("alice");
    store.add_user("carol");
    store.set_passed_words("carol", 7);

    let board = FriendRanking::new(store.clone())
        .add_friend("alice", " carol", day(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(store.friend_writes(), 1);
    assert_eq!(store.stored_friends("alice"), vec!["carol"]);
    assert_eq!(board.friends, vec!["carol"]);
    assert_eq!(board.vocabulary[0].name, "carol");
}

#[tokio::test]
async fn test_streak_window_of_21_days() {
    let store = FakeStore::new();
    let today = day(2024, 3, 5);
    store.complete_day("alice", today);
    store.complete_day("alice", day(2024, 3, 4));
    store.complete_day("alice", day(2024, 2, 14));

    let calendar = StreakCalendar::new(store.clone());
    let days = calendar.window("alice", today, 21).await.unwrap();

    assert_eq!(days.len(), 21);
    assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    assert_eq!(days.last().unwrap().date, today);
    assert_eq!(days.first().unwrap().date, day(2024, 2, 14));
    assert_eq!(days.iter().filter(|d| d.completed).count(), 3);
    assert_eq!(lingo_core::streak::current_streak(&days), 2);
}

#[tokio::test]
async fn test_friends_done_today() {
    let store = FakeStore::new();
    let today = day(2024, 3, 5);
    store.set_friends("alice", &["dave", "bob", "carol"]);
    store.complete_day("dave", today);
    store.complete_day("bob", today);
    store.complete_day("carol", day(2024, 3, 4));
    store.complete_day("alice", today);

    let done = StreakCalendar::new(store.clone())
        .friends_done_today("alice", today)
        .await
        .unwrap();
    assert_eq!(done, vec!["alice", "bob", "dave"]);
}

#[tokio::test]
async fn test_register_trims_and_rejects_taken_names() {
    let store = FakeStore::new();
    let dyn_store: Arc<dyn RecordStore> = store.clone();

    let user = accounts::register(dyn_store.as_ref(), "  alice ", "h1").await.unwrap();
    assert_eq!(user.user_name, "alice");

    let again = accounts::register(dyn_store.as_ref(), "alice", "h2").await;
    assert!(matches!(again, Err(CoreError::NameTaken)));

    let empty = accounts::register(dyn_store.as_ref(), "   ", "h3").await;
    assert!(matches!(empty, Err(CoreError::EmptyName)));

    let creds = accounts::find_credentials(dyn_store.as_ref(), "alice ").await.unwrap();
    assert_eq!(creds.password_hash, "h1");
    let missing = accounts::find_credentials(dyn_store.as_ref(), "bob").await;
    assert!(matches!(missing, Err(CoreError::UnknownAccount)));
}
