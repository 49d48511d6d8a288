use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{header, multipart, Client};
use serde_json::{json, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::AudioUpload;
use crate::services::LanguageModel;

const SYSTEM_PROMPT: &str = "You are a careful medical assistant helping a doctor draft prescriptions. Reply with JSON only.";

/// OpenAI-compatible chat and transcription endpoints.
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    transcription_model: String,
}

impl OpenAiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            http_client: Client::new(),
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            transcription_model: config.openai_transcription_model.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Requesting completion from {}", self.model);

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.2,
            "max_tokens": 300
        });

        let response = self.http_client.post(self.endpoint("chat/completions"))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("OpenAI completion failed ({}): {}", status, error_text);
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let ai_response: Value = response.json().await?;
        let content = ai_response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("Invalid OpenAI response format"))?;

        Ok(content.to_string())
    }

    async fn transcribe(&self, audio: AudioUpload) -> Result<String> {
        debug!("Transcribing {} ({} bytes)", audio.file_name, audio.bytes.len());

        let file = multipart::Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.content_type)?;
        let form = multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", file);

        let response = self.http_client.post(self.endpoint("audio/transcriptions"))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("OpenAI transcription failed ({}): {}", status, error_text);
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let transcription: Value = response.json().await?;
        Ok(transcription["text"].as_str().unwrap_or_default().to_string())
    }
}
