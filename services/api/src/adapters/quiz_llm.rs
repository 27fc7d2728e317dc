//! services/api/src/adapters/quiz_llm.rs
//!
//! This module contains the adapter for the quiz-generating LLM.
//! It implements the `QuizGenerationService` port from the `core` crate.

const CHINESE_INSTRUCTIONS: &str = r#"你是一位專業的英語教學助手，專門為中文母語者設計英語學習內容。請分析以下英文文本，並生成4道互動式測驗題目，幫助中文學習者掌握這段文本。

請遵循以下原則：
1. **詞彙選擇題 (vocabulary_mcq)**: 選擇文本中對中文學習者較有挑戰性的詞彙，提供中文解釋或英文同義詞選擇。錯誤選項應該是相似但不正確的詞彙。
2. **閱讀理解題 (comprehension_mcq)**: 測試對文本主要概念、細節或推論的理解。問題應該用中文提出，選項可以是中文或英文。
3. **填空題 (fill_in_the_blank)**: 選擇關鍵詞彙或語法結構，幫助學習者練習語言運用。
4. 所有問題和選項都用繁體中文提出，除非是專門測試英文詞彙的部分。
5. 提供簡潔的解釋說明為什麼這是正確答案，用中文解釋。

請確保題目難度適中，既有挑戰性又不會讓學習者感到挫折。"#;

const ENGLISH_INSTRUCTIONS: &str = r#"You are a professional English language learning assistant specializing in creating content for Chinese native speakers learning English. Analyze the following English text and generate 4 interactive quiz questions to help Chinese learners master this text.

Please follow these principles:
1. **Vocabulary Multiple Choice (vocabulary_mcq)**: Select vocabulary from the text that would be challenging for Chinese learners. Focus on words that have nuanced meanings, false cognates, or common usage patterns that differ from Chinese.
2. **Reading Comprehension (comprehension_mcq)**: Test understanding of main concepts, details, or inferences. Questions should focus on areas where Chinese learners typically struggle.
3. **Fill-in-the-blank (fill_in_the_blank)**: Choose key vocabulary or grammatical structures that are important for language development.
4. All questions and options should be in English to maximize language exposure and practice.
5. Provide brief explanations in English for why the answer is correct, focusing on language learning insights.

Ensure questions are appropriately challenging but not frustrating for intermediate English learners."#;

const OUTPUT_FORMAT: &str = r#"Respond with ONLY a JSON array. Each element has the fields:
"questionType" (one of "vocabulary_mcq", "comprehension_mcq", "fill_in_the_blank"),
"questionText" (use "_____" for the blank in fill-in-the-blank questions),
"options" (an array of 4 strings for multiple choice, null for fill-in-the-blank),
"answer" (the exact text of the correct option, or the word that fills the blank),
"explanation"."#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use lingo_core::ports::{PortError, PortResult, QuizGenerationService};
use lingo_core::quiz::{QuizLanguage, QuizQuestion};
use regex::Regex;
use tracing::{info, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuizGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct GeminiQuizAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiQuizAdapter {
    /// Creates a new `GeminiQuizAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    pub fn build_prompt(text: &str, language: QuizLanguage) -> String {
        let instructions = match language {
            QuizLanguage::Chinese => CHINESE_INSTRUCTIONS,
            QuizLanguage::English => ENGLISH_INSTRUCTIONS,
        };
        format!(
            "{}\n\n文本內容 / TEXT:\n---\n{}\n---\n\n{}",
            instructions, text, OUTPUT_FORMAT
        )
    }

    /// Parses the model output, tolerating a surrounding markdown code fence.
    pub fn parse_quiz(raw: &str) -> PortResult<Vec<QuizQuestion>> {
        let fence = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$")
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let body = fence
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(raw);

        let questions: Vec<QuizQuestion> = serde_json::from_str(body.trim())
            .map_err(|e| PortError::Malformed(format!("Quiz JSON did not parse: {}", e)))?;
        if questions.is_empty() {
            return Err(PortError::Malformed("Quiz generator returned no questions".to_string()));
        }
        Ok(questions)
    }
}

//=========================================================================================
// `QuizGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuizGenerationService for GeminiQuizAdapter {
    async fn generate_quiz(
        &self,
        text: &str,
        language: QuizLanguage,
    ) -> PortResult<Vec<QuizQuestion>> {
        let prompt = Self::build_prompt(text, language);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into()])
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let raw = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PortError::Malformed("Quiz response contained no text content.".to_string()))?;

        match Self::parse_quiz(&raw) {
            Ok(questions) => {
                info!(count = questions.len(), ?language, "Quiz generated");
                Ok(questions)
            }
            Err(e) => {
                warn!(error = %e, "Discarding unparseable quiz output");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::quiz::QuestionType;

    const SAMPLE: &str = r#"[
        {"questionType":"vocabulary_mcq","questionText":"What does 'reluctant' mean?","options":["不情願的","快樂的","勇敢的","安靜的"],"answer":"不情願的","explanation":"reluctant = unwilling"},
        {"questionType":"fill_in_the_blank","questionText":"She _____ to school.","options":null,"answer":"walked","explanation":"past tense"}
    ]"#;

    #[test]
    fn test_parse_plain_json() {
        let questions = GeminiQuizAdapter::parse_quiz(SAMPLE).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question_type, QuestionType::VocabularyMcq);
        assert_eq!(questions[0].options.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", SAMPLE);
        let questions = GeminiQuizAdapter::parse_quiz(&fenced).unwrap();
        assert_eq!(questions[1].answer, "walked");
    }

    #[test]
    fn test_parse_rejects_garbage_and_empty() {
        assert!(matches!(
            GeminiQuizAdapter::parse_quiz("Sure! Here is your quiz."),
            Err(PortError::Malformed(_))
        ));
        assert!(matches!(
            GeminiQuizAdapter::parse_quiz("[]"),
            Err(PortError::Malformed(_))
        ));
    }

    #[test]
    fn test_prompt_embeds_text_and_language() {
        let zh = GeminiQuizAdapter::build_prompt("The cat sat.", QuizLanguage::Chinese);
        assert!(zh.contains("The cat sat."));
        assert!(zh.contains("繁體中文"));
        let en = GeminiQuizAdapter::build_prompt("The cat sat.", QuizLanguage::English);
        assert!(en.contains("All questions and options should be in English"));
    }
}
