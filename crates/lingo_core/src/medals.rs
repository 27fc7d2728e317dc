//! crates/lingo_core/src/medals.rs
//!
//! Threshold-based achievement badges. Medals are never stored; they are
//! recomputed from the progress counts on every read.

use std::collections::BTreeSet;

/// Which progress count a medal is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Vocabulary,
    Conversation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Medal {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub metric: Metric,
    pub threshold: u32,
}

impl Medal {
    pub fn achieved(&self, vocab_passed: u32, conv_count: u32) -> bool {
        match self.metric {
            Metric::Vocabulary => vocab_passed >= self.threshold,
            Metric::Conversation => conv_count >= self.threshold,
        }
    }
}

pub const MEDALS: [Medal; 4] = [
    Medal {
        id: "vocab10",
        label: "單字新手",
        description: "學習通過10個單字",
        metric: Metric::Vocabulary,
        threshold: 10,
    },
    Medal {
        id: "vocab30",
        label: "單字高手",
        description: "學習通過30個單字",
        metric: Metric::Vocabulary,
        threshold: 30,
    },
    Medal {
        id: "conv10",
        label: "對話新手",
        description: "完成10次AI對話",
        metric: Metric::Conversation,
        threshold: 10,
    },
    Medal {
        id: "conv50",
        label: "對話達人",
        description: "完成50次AI對話",
        metric: Metric::Conversation,
        threshold: 50,
    },
];

/// The ids of the medals a user has earned.
pub type MedalSet = BTreeSet<&'static str>;

/// A medal together with whether it has been earned, for the medal page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedalStatus {
    pub medal: Medal,
    pub achieved: bool,
}

pub fn evaluate(vocab_passed: u32, conv_count: u32) -> MedalSet {
    evaluate_with(&MEDALS, vocab_passed, conv_count)
}

pub fn evaluate_with(medals: &[Medal], vocab_passed: u32, conv_count: u32) -> MedalSet {
    medals
        .iter()
        .filter(|m| m.achieved(vocab_passed, conv_count))
        .map(|m| m.id)
        .collect()
}

/// Every medal in catalogue order with its achieved flag.
pub fn medal_board(vocab_passed: u32, conv_count: u32) -> Vec<MedalStatus> {
    MEDALS
        .iter()
        .map(|&medal| MedalStatus {
            medal,
            achieved: medal.achieved(vocab_passed, conv_count),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_mixed_progress() {
        let achieved = evaluate(12, 55);
        let expected: MedalSet = ["vocab10", "conv10", "conv50"].into_iter().collect();
        assert_eq!(achieved, expected);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        assert!(evaluate(9, 0).is_empty());
        assert_eq!(evaluate(10, 0).len(), 1);
        assert_eq!(evaluate(30, 50).len(), 4);
    }

    #[test]
    fn test_monotonic_in_vocabulary() {
        for conv in [0, 10, 49, 50] {
            for low in 0..40 {
                for high in low..40 {
                    let a = evaluate(low, conv);
                    let b = evaluate(high, conv);
                    assert!(a.is_subset(&b), "{low} -> {high} at conv {conv}");
                }
            }
        }
    }

    #[test]
    fn test_medal_board_keeps_catalogue_order() {
        let board = medal_board(30, 0);
        let ids: Vec<_> = board.iter().map(|s| s.medal.id).collect();
        assert_eq!(ids, vec!["vocab10", "vocab30", "conv10", "conv50"]);
        assert!(board[1].achieved);
        assert!(!board[2].achieved);
    }
}
