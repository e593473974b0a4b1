//! Hugging Face Inference API text generation backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::http::{RequestOptions, send_with_retry};
use crate::contexts::{GenerationError, TextGenerator};

pub const HUGGINGFACE_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const HUGGINGFACE_DEFAULT_MODEL: &str = "codellama/CodeLlama-34b-Instruct-hf";
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 512;

#[derive(Debug, Clone, Serialize)]
pub struct GenerationParameters {
    pub do_sample: bool,
    pub max_new_tokens: u32,
    pub return_full_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    pub inputs: String,
    pub parameters: GenerationParameters,
}

#[derive(Debug)]
pub struct HuggingFaceGenerator {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    options: RequestOptions,
}

impl HuggingFaceGenerator {
    pub fn new(api_key: String, model: String, options: RequestOptions) -> Result<Self, GenerationError> {
        Ok(Self {
            http: options.client()?,
            base_url: options.base_url_or(HUGGINGFACE_BASE_URL),
            api_key,
            model,
            options,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    pub fn request(&self, prompt: &str) -> InferenceRequest {
        InferenceRequest {
            inputs: prompt.to_string(),
            parameters: GenerationParameters {
                do_sample: true,
                max_new_tokens: self.options.max_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS),
                return_full_text: false,
                temperature: self.options.temperature,
            },
        }
    }
}

/// Pulls `generated_text` out of either a list or a single object response.
fn generated_text(body: &Value) -> Result<String, GenerationError> {
    let item = match body {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(body),
        _ => None,
    };

    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(GenerationError::InvalidResponse(error.to_string()));
    }

    item.and_then(|v| v.get("generated_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GenerationError::InvalidResponse("no generated_text in response".into()))
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
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

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("failed to parse response: {e}")))?;

        generated_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_sampling_without_echo() {
        let generator = HuggingFaceGenerator::new(
            "hf-key".into(),
            HUGGINGFACE_DEFAULT_MODEL.into(),
            RequestOptions::default(),
        )
        .unwrap();

        assert_eq!(
            generator.endpoint(),
            "https://api-inference.huggingface.co/models/codellama/CodeLlama-34b-Instruct-hf"
        );

        let json = serde_json::to_value(generator.request("hello")).unwrap();
        assert_eq!(json["inputs"], "hello");
        assert_eq!(json["parameters"]["do_sample"], true);
        assert_eq!(json["parameters"]["max_new_tokens"], 512);
        assert_eq!(json["parameters"]["return_full_text"], false);
    }

    #[test]
    fn reads_list_and_object_responses() {
        let list = serde_json::json!([{"generated_text": "fn main() {}"}]);
        assert_eq!(generated_text(&list).unwrap(), "fn main() {}");

        let object = serde_json::json!({"generated_text": "x = 1"});
        assert_eq!(generated_text(&object).unwrap(), "x = 1");
    }

    #[test]
    fn error_payload_is_invalid_response() {
        let body = serde_json::json!({"error": "Model too busy"});
        let err = generated_text(&body).unwrap_err();
        assert!(err.to_string().contains("Model too busy"));

        assert!(generated_text(&serde_json::json!([])).is_err());
    }
}
