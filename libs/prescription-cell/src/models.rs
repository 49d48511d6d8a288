use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    pub diagnosis: String,
    pub medicines: Vec<MedicineEntry>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A prescribed medicine, either free text ("Paracetamol 500mg") or a
/// structured entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MedicineEntry {
    Name(String),
    Detailed(Medicine),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Any other keys the client sent (frequency, route, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Medicine {
    pub fn new(name: &str, dosage: &str, duration: &str) -> Self {
        Self {
            name: name.to_string(),
            dosage: Some(dosage.to_string()),
            duration: Some(duration.to_string()),
            extra: Map::new(),
        }
    }
}

impl MedicineEntry {
    pub fn name(&self) -> &str {
        match self {
            MedicineEntry::Name(name) => name,
            MedicineEntry::Detailed(medicine) => &medicine.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub patient_id: i64,
    pub diagnosis: String,
    #[serde(default)]
    pub medicines: Vec<MedicineEntry>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn medicines_accept_strings_and_objects() {
        let entries: Vec<MedicineEntry> = serde_json::from_value(json!([
            "Cetirizine 10mg",
            {"name": "Amoxicillin", "dosage": "500 mg", "duration": "5 days", "frequency": "TID"}
        ]))
        .unwrap();

        assert_eq!(entries[0], MedicineEntry::Name("Cetirizine 10mg".to_string()));
        match &entries[1] {
            MedicineEntry::Detailed(medicine) => {
                assert_eq!(medicine.dosage.as_deref(), Some("500 mg"));
                assert_eq!(medicine.extra["frequency"], "TID");
            }
            other => panic!("expected a structured medicine, got {:?}", other),
        }
        assert_eq!(entries[1].name(), "Amoxicillin");
    }

    #[test]
    fn structured_medicine_serializes_flat() {
        let value = serde_json::to_value(MedicineEntry::Detailed(Medicine::new("ORS", "After meals", "3 days"))).unwrap();
        assert_eq!(value, json!({"name": "ORS", "dosage": "After meals", "duration": "3 days"}));
    }
}
