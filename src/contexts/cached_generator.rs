use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

use super::FileCache;
use super::text_generator::{GenerationError, TextGenerator};
use crate::data::Cache;

/// Wraps a generator with a persistent completion cache.
///
/// Only successful completions are stored, so a transient provider failure is
/// retried on the next call instead of being replayed.
pub struct CachedGenerator<G> {
    inner: G,
    cache: FileCache,
}

impl<G: TextGenerator> CachedGenerator<G> {
    /// `system_context` is whatever fixed instructions the provider sends
    /// alongside each prompt; changing it invalidates the partition.
    pub fn new(inner: G, cache_dir: impl AsRef<Path>, system_context: &str) -> Self {
        let partition = sha256_hex(&format!("{}:{}", system_context, inner.model_name()));
        Self {
            cache: FileCache::new(cache_dir, partition),
            inner,
        }
    }

    pub fn into_inner(self) -> G {
        self.inner
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for CachedGenerator<G> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let key = sha256_hex(prompt);

        if let Some(hit) = self.cache.get(&key) {
            debug!("Completion cache hit {}", &key[..12]);
            return Ok(hit);
        }

        let output = self.inner.try_generate(prompt).await?;
        self.cache.set(&key, &output);
        Ok(output)
    }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
