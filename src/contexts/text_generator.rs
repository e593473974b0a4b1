use async_trait::async_trait;

/// Errors a provider can hit while producing a completion.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("missing API key: {0}")]
    MissingApiKey(String),
}

/// The text generation port: send a prompt, get raw text back.
///
/// Implementors provide [`TextGenerator::try_generate`]. Callers use
/// [`TextGenerator::generate`], which never fails: a provider error comes
/// back as text starting with `"Error: "` so every outcome can be handled as
/// text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, used to partition response caches.
    fn model_name(&self) -> &str;

    /// Single completion attempt.
    async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError>;

    async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e),
        }
    }
}

#[async_trait]
impl<G: TextGenerator + ?Sized> TextGenerator for Box<G> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).try_generate(prompt).await
    }
}

/// Whether a port result is an inline error rather than model output.
pub fn is_error_text(text: &str) -> bool {
    text.starts_with("Error: ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn try_generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            })
        }
    }

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
            Ok(prompt.to_string())
        }
    }

    #[tokio::test]
    async fn failures_become_error_text() {
        let text = Failing.generate("anything").await;
        assert!(is_error_text(&text));
        assert!(text.contains("401"));
        assert!(text.contains("invalid api key"));
    }

    #[tokio::test]
    async fn successes_pass_through() {
        assert_eq!(Echo.generate("hello").await, "hello");
    }

    #[tokio::test]
    async fn boxed_generators_delegate() {
        let boxed: Box<dyn TextGenerator> = Box::new(Echo);
        assert_eq!(boxed.model_name(), "echo");
        assert_eq!(boxed.generate("hi").await, "hi");
    }
}
