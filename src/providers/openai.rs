//! OpenAI Chat Completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{RequestOptions, send_with_retry};
use crate::contexts::{GenerationError, TextGenerator};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
pub const CODE_GENERATOR_SYSTEM_PROMPT: &str =
    "You are a code generator application. Simply return the raw code content based on requests.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug)]
pub struct OpenAiGenerator {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    options: RequestOptions,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, options: RequestOptions) -> Result<Self, GenerationError> {
        Ok(Self {
            http: options.client()?,
            base_url: options.base_url_or(OPENAI_BASE_URL),
            api_key,
            model,
            options,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    pub fn request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: CODE_GENERATOR_SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt.into(),
                },
            ],
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        }
    }
}

fn first_completion(response: ChatResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GenerationError::InvalidResponse("no completion in response".into()))
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self.endpoint();
        let request = self.request(prompt);

        let response = send_with_retry(self.options.retries, || {
            self.http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
        })
        .await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("failed to parse response: {e}")))?;

        first_completion(body)
    }
}
