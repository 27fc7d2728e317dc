//! crates/lingo_core/src/scenarios.rs
//!
//! Role-play settings for the AI tutor. Each one opens the chat with a fixed
//! assistant line.

use crate::domain::{ChatRole, ChatTurn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub key: &'static str,
    pub label: &'static str,
    pub opening: &'static str,
}

impl Scenario {
    pub fn opening_turn(&self) -> ChatTurn {
        ChatTurn {
            role: ChatRole::Assistant,
            content: self.opening.to_string(),
        }
    }
}

pub const DEFAULT_SCENARIO: &str = "default";

pub const SCENARIOS: [Scenario; 4] = [
    Scenario {
        key: "default",
        label: "一般對話",
        opening: "Hi! What do you want to talk to me about today?",
    },
    Scenario {
        key: "airport",
        label: "機場英文",
        opening: "You are at the airport. Let's practice a conversation: \"Hello, I would like to check in for my flight to London.\"",
    },
    Scenario {
        key: "restaurant",
        label: "餐廳點餐",
        opening: "You are at a restaurant. Let's practice: \"Hi, I would like to order a steak and a salad, please.\"",
    },
    Scenario {
        key: "hospital",
        label: "醫院看診",
        opening: "You are visiting a doctor. Let's practice: \"Doctor, I have a headache and a sore throat.\"",
    },
];

pub fn find_scenario(key: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.key == key)
}
