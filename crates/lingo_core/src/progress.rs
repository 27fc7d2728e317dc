//! crates/lingo_core/src/progress.rs
//!
//! Per-user progress counts and the only write path that feeds them:
//! marking a flashcard learned or not learned.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::domain::Progress;
use crate::error::CoreResult;
use crate::ports::RecordStore;

#[derive(Clone)]
pub struct ProgressAggregator {
    store: Arc<dyn RecordStore>,
}

impl ProgressAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Counts passed words and logged conversations, and checks today's challenge.
    ///
    /// The three reads are independent and run concurrently. A failed read fails
    /// the whole aggregate; it is never reported as zero.
    #[instrument(level = "debug", skip(self))]
    pub async fn aggregate(&self, user_name: &str, today: NaiveDate) -> CoreResult<Progress> {
        let (vocab_passed, conv_count, today_record) = futures::try_join!(
            self.store.count_passed_words(user_name),
            self.store.count_conversations(user_name),
            self.store.get_daily_completion(today, user_name),
        )?;

        Ok(Progress {
            vocab_passed,
            conv_count,
            today_completed: today_record.unwrap_or(false),
        })
    }

    /// Records a flashcard result. Passing a word also completes today's challenge.
    ///
    /// These are two separate upserts: if the second fails, the word stays marked
    /// while the challenge does not.
    #[instrument(level = "debug", skip(self))]
    pub async fn mark_word(
        &self,
        user_name: &str,
        word_id: &str,
        passed: bool,
        today: NaiveDate,
    ) -> CoreResult<()> {
        self.store
            .upsert_word_progress(user_name, word_id, passed)
            .await?;

        if passed {
            self.store
                .upsert_daily_completion(today, user_name, true)
                .await?;
            debug!(%user_name, %today, "daily challenge completed");
        }
        Ok(())
    }
}
