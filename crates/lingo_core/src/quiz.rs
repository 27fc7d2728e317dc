//! crates/lingo_core/src/quiz.rs
//!
//! Reading quizzes generated from a text: question shape and scoring.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    VocabularyMcq,
    ComprehensionMcq,
    FillInTheBlank,
}

/// Which language the questions and explanations are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizLanguage {
    #[default]
    Chinese,
    English,
}

/// One generated question. Field names follow the generator's JSON schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question_type: QuestionType,
    pub question_text: String,
    /// Four choices for multiple-choice questions, absent for fill-in-the-blank.
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, given: &str) -> bool {
        given == self.answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

/// Exact-match scoring; unanswered questions count as wrong.
pub fn score(questions: &[QuizQuestion], answers: &HashMap<usize, String>) -> QuizScore {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(index, q)| answers.get(index).is_some_and(|a| q.is_correct(a)))
        .count();
    QuizScore {
        correct,
        total: questions.len(),
    }
}
