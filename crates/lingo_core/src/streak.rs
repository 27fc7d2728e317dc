//! crates/lingo_core/src/streak.rs
//!
//! The daily-challenge calendar. Day keys are the viewer's local calendar day,
//! so callers resolve "today" with the viewer's UTC offset before calling in.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Utc};
use futures::future::try_join_all;
use tracing::instrument;

use crate::domain::StreakDay;
use crate::error::CoreResult;
use crate::ports::RecordStore;
use crate::ranking::FriendRanking;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Longest calendar window a caller may ask for.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// `YYYY-MM-DD`, the key format of the daily challenge collection.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Today's date for a viewer `offset_minutes` east of UTC.
///
/// Without an offset (or with one outside ±24h) the server's local day is used.
pub fn local_today(offset_minutes: Option<i32>) -> NaiveDate {
    local_today_at(Utc::now(), offset_minutes)
}

/// The viewer's calendar day at the instant `now`.
pub fn local_today_at(now: DateTime<Utc>, offset_minutes: Option<i32>) -> NaiveDate {
    match offset_minutes.and_then(|m| FixedOffset::east_opt(m.checked_mul(60)?)) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.with_timezone(&Local).date_naive(),
    }
}

/// The `days` dates ending at `today`, oldest first.
///
/// The iterator is cheap to clone and can be walked again from the start.
pub fn window_dates(today: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> + Clone {
    (0..days)
        .rev()
        .map(move |back| today - Duration::days(i64::from(back)))
}

/// Consecutive completed days at the end of `days`.
///
/// An unfinished last day (today) does not break the run; counting starts the
/// day before.
pub fn current_streak(days: &[StreakDay]) -> u32 {
    let mut iter = days.iter().rev().peekable();
    if matches!(iter.peek(), Some(day) if !day.completed) {
        iter.next();
    }
    iter.take_while(|day| day.completed).count() as u32
}

#[derive(Clone)]
pub struct StreakCalendar {
    store: Arc<dyn RecordStore>,
    ranking: FriendRanking,
}

impl StreakCalendar {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let ranking = FriendRanking::new(store.clone());
        Self { store, ranking }
    }

    /// One entry per day of the window; a day with no record is not completed.
    #[instrument(level = "debug", skip(self))]
    pub async fn window(
        &self,
        user_name: &str,
        today: NaiveDate,
        days: u32,
    ) -> CoreResult<Vec<StreakDay>> {
        let lookups = window_dates(today, days).map(|date| async move {
            let completed = self.store.get_daily_completion(date, user_name).await?;
            Ok::<_, crate::ports::PortError>(StreakDay {
                date,
                completed: completed.unwrap_or(false),
            })
        });
        Ok(try_join_all(lookups).await?)
    }

    /// Members of the caller's group (including the caller) who finished today, by name.
    #[instrument(level = "debug", skip(self))]
    pub async fn friends_done_today(
        &self,
        user_name: &str,
        today: NaiveDate,
    ) -> CoreResult<Vec<String>> {
        let group = self.ranking.group(user_name).await?;
        let flags = try_join_all(group.iter().map(|name| async move {
            self.store.get_daily_completion(today, name).await
        }))
        .await?;

        let mut done: Vec<String> = group
            .into_iter()
            .zip(flags)
            .filter(|(_, completed)| completed.unwrap_or(false))
            .map(|(name, _)| name)
            .collect();
        done.sort();
        Ok(done)
    }
}
