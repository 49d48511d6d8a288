use serde::{Deserialize, Serialize};

pub use prescription_cell::Medicine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionSuggestionRequest {
    pub diagnosis: String,
    pub symptoms: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionSuggestion {
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// An uploaded audio clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AudioUpload {
    pub fn new(file_name: Option<&str>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.unwrap_or("audio.wav").to_string(),
            content_type: content_type.unwrap_or("audio/wav").to_string(),
            bytes,
        }
    }
}
