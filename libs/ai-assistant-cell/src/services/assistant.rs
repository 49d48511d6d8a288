use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::error::AssistantError;
use crate::models::{AudioUpload, Medicine, PrescriptionSuggestion, PrescriptionSuggestionRequest, TranscriptionResponse};
use crate::services::rules::{fallback_medicines, FALLBACK_NOTE};
use crate::services::{LanguageModel, OpenAiClient};

const MODEL_NOTE: &str = "AI-generated. Please review.";
const NOTE_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct ModelPrescription {
    #[serde(default)]
    medicines: Vec<Medicine>,
    #[serde(default, alias = "notes")]
    note: Option<String>,
}

pub struct AssistantService {
    model: Option<Arc<dyn LanguageModel>>,
}

impl AssistantService {
    /// Uses OpenAI when a key is configured, rules only otherwise.
    pub fn new(config: &AppConfig) -> Self {
        let model = match OpenAiClient::new(config) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn LanguageModel>),
            Err(e) => {
                warn!("Language model disabled: {}", e);
                None
            }
        };

        Self { model }
    }

    pub fn with_model(model: Arc<dyn LanguageModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn rules_only() -> Self {
        Self { model: None }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub async fn suggest_prescription(
        &self,
        request: PrescriptionSuggestionRequest,
    ) -> Result<PrescriptionSuggestion, AssistantError> {
        let diagnosis = request.diagnosis.trim().to_string();
        if diagnosis.is_empty() {
            return Err(AssistantError::EmptyDiagnosis);
        }
        let symptoms = request
            .symptoms
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let fallback = || PrescriptionSuggestion {
            diagnosis: diagnosis.clone(),
            medicines: fallback_medicines(&diagnosis, symptoms),
            notes: Some(FALLBACK_NOTE.to_string()),
        };

        let Some(model) = &self.model else {
            return Ok(fallback());
        };

        let prompt = format!(
            "Given a diagnosis and optional symptoms, return a JSON object with \"medicines\" \
             (a list of {{\"name\", \"dosage\", \"duration\"}}) and a short \"note\". \
             Diagnosis: {}. Symptoms: {}.",
            diagnosis,
            symptoms.unwrap_or("None")
        );

        let reply = match model.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Language model call failed, using rules: {}", e);
                return Ok(fallback());
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            warn!("Language model returned an empty reply, using rules");
            return Ok(fallback());
        }

        match parse_model_reply(reply) {
            Some(parsed) if !parsed.medicines.is_empty() => {
                info!("Model suggested {} medicine(s) for '{}'", parsed.medicines.len(), diagnosis);
                Ok(PrescriptionSuggestion {
                    diagnosis,
                    medicines: parsed.medicines,
                    notes: Some(
                        parsed
                            .note
                            .filter(|n| !n.trim().is_empty())
                            .unwrap_or_else(|| MODEL_NOTE.to_string()),
                    ),
                })
            }
            _ => {
                warn!("Model reply had no usable medicines, keeping its text as the note");
                Ok(PrescriptionSuggestion {
                    diagnosis: diagnosis.clone(),
                    medicines: fallback_medicines(&diagnosis, symptoms),
                    notes: Some(reply.chars().take(NOTE_CHARS).collect()),
                })
            }
        }
    }

    pub async fn transcribe(&self, audio: AudioUpload) -> Result<TranscriptionResponse, AssistantError> {
        let model = self.model.as_ref().ok_or(AssistantError::TranscriptionUnavailable)?;

        if audio.bytes.is_empty() {
            return Err(AssistantError::InvalidUpload("Audio file is empty".to_string()));
        }

        let text = model
            .transcribe(audio)
            .await
            .map_err(|e| AssistantError::TranscriptionFailed(e.to_string()))?;

        Ok(TranscriptionResponse { text })
    }
}

/// Reads the JSON object out of a reply that may be wrapped in prose or a
/// code fence.
fn parse_model_reply(reply: &str) -> Option<ModelPrescription> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    serde_json::from_str(&reply[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json() {
        let reply = "Here you go:\n```json\n{\"medicines\": [{\"name\": \"Cetirizine\", \"dosage\": \"10 mg\", \"duration\": \"5 days\"}], \"notes\": \"Avoid driving\"}\n```";
        let parsed = parse_model_reply(reply).unwrap();

        assert_eq!(parsed.medicines[0].name, "Cetirizine");
        assert_eq!(parsed.note.as_deref(), Some("Avoid driving"));
    }

    #[test]
    fn prose_is_not_json() {
        assert!(parse_model_reply("Take rest and fluids.").is_none());
        assert!(parse_model_reply("} backwards {").is_none());
    }
}
