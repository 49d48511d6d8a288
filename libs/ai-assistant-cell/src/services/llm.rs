use anyhow::Result;
use async_trait::async_trait;

use crate::models::AudioUpload;

/// A hosted model the assistant can delegate to.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the model's text reply to `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Returns the transcript of `audio`.
    async fn transcribe(&self, audio: AudioUpload) -> Result<String>;
}
