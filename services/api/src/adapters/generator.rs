//! services/api/src/adapters/generator.rs
//!
//! This module contains the adapter for the content-generating LLM.
//! It implements the `ContentGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use jobdigest_core::{
    domain::GenerationType,
    ports::{ContentGenerationService, PortError, PortResult},
};

/// Returned in place of generated content when no API key is configured.
/// This is a deliberate soft failure: the rest of the ingestion pipeline
/// (record creation included) still completes.
pub const UNCONFIGURED_PLACEHOLDER: &str = "Error: AI API key not configured.";

const SUMMARY_INSTRUCTIONS: &str = "You are an expert HR assistant. Summarize the following \
job description in 3-5 sentences, focusing on the main responsibilities, company, and role \
highlights.";

const KEY_POINTS_INSTRUCTIONS: &str = "You are an expert recruiter. Extract the key \
requirements, qualifications, and skills from the following job description. Present them as \
a concise bulleted list.";

const FLASHCARDS_INSTRUCTIONS: &str = "You are a data analyst. Convert the following job \
description into a structured JSON object with fields: title, company, location, \
responsibilities, requirements, and benefits.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ContentGenerationService` using an
/// OpenAI-compatible LLM endpoint.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`. When `api_key` is `None` the
    /// adapter stays unconfigured and every call yields the placeholder string.
    pub fn new(api_key: Option<&str>, api_base: &str, model: String) -> Self {
        let client = api_key.map(|key| {
            Client::with_config(
                OpenAIConfig::new()
                    .with_api_key(key)
                    .with_api_base(api_base),
            )
        });
        Self { client, model }
    }

    fn instructions(kind: GenerationType) -> &'static str {
        match kind {
            GenerationType::Summary => SUMMARY_INSTRUCTIONS,
            GenerationType::KeyPoints => KEY_POINTS_INSTRUCTIONS,
            GenerationType::Flashcards => FLASHCARDS_INSTRUCTIONS,
        }
    }
}

//=========================================================================================
// `ContentGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentGenerationService for OpenAiGenerationAdapter {
    async fn generate(&self, text: &str, kind: GenerationType) -> PortResult<String> {
        let Some(client) = &self.client else {
            return Ok(UNCONFIGURED_PLACEHOLDER.to_string());
        };

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(Self::instructions(kind))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Job Description:\n{}", text))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|_: OpenAIError| {
                PortError::Unexpected("Failed to generate content with AI.".to_string())
            })?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Generation LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Generation LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_adapter_soft_fails_with_placeholder() {
        let adapter = OpenAiGenerationAdapter::new(None, "http://unused", "test".to_string());
        let output = adapter
            .generate("some text", GenerationType::Summary)
            .await
            .unwrap();
        assert_eq!(output, UNCONFIGURED_PLACEHOLDER);
    }

    #[test]
    fn each_kind_selects_a_distinct_template() {
        let summary = OpenAiGenerationAdapter::instructions(GenerationType::Summary);
        let key_points = OpenAiGenerationAdapter::instructions(GenerationType::KeyPoints);
        let flashcards = OpenAiGenerationAdapter::instructions(GenerationType::Flashcards);
        assert_ne!(summary, key_points);
        assert_ne!(key_points, flashcards);
        assert!(flashcards.contains("JSON"));
    }
}
