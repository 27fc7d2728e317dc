//! services/api/src/adapters/tutor_llm.rs
//!
//! This module contains the adapter for the conversational English tutor.
//! It implements the `TutorService` port from the `core` crate, talking to Gemini
//! through its OpenAI-compatible chat completions endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use lingo_core::domain::{ChatRole, ChatTurn};
use lingo_core::ports::{PortError, PortResult, TutorService};
use tracing::debug;

const SYSTEM_INSTRUCTIONS: &str = "You are a friendly English conversation partner for Chinese-speaking learners. \
Stay in the role-play the conversation opened with, reply in natural, simple English, \
and keep each reply to a few sentences so the learner can answer.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TutorService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct GeminiTutorAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiTutorAdapter {
    /// Creates a new `GeminiTutorAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn to_message(turn: &ChatTurn) -> Result<ChatCompletionRequestMessage, OpenAIError> {
        Ok(match turn.role {
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(turn.content.as_str())
                .build()?
                .into(),
            ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(turn.content.as_str())
                .build()?
                .into(),
        })
    }
}

//=========================================================================================
// `TutorService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TutorService for GeminiTutorAdapter {
    /// Sends the whole transcript and returns the tutor's next line.
    async fn reply(&self, history: &[ChatTurn]) -> PortResult<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 1);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        for turn in history {
            messages.push(Self::to_message(turn).map_err(|e| PortError::Unexpected(e.to_string()))?);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let reply = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| PortError::Malformed("Tutor response contained no text content.".to_string()))?;

        debug!(reply_len = reply.len(), "Tutor replied");
        Ok(reply)
    }
}
