use crate::models::Medicine;

pub const FALLBACK_NOTE: &str = "AI-generated (fallback). Please review.";

/// Keyword-based suggestion used when no model is configured or the model
/// gives nothing usable. Matching is case-insensitive over the diagnosis and
/// symptoms together; the first matching rule wins.
pub fn fallback_medicines(diagnosis: &str, symptoms: Option<&str>) -> Vec<Medicine> {
    let text = format!("{} {}", diagnosis, symptoms.unwrap_or_default()).to_lowercase();

    if text.contains("fever") {
        return vec![
            Medicine::new("Paracetamol", "650 mg", "3 days"),
            Medicine::new("ORS", "After meals", "3 days"),
        ];
    }

    if text.contains("back pain") {
        return vec![Medicine::new("Ibuprofen", "400 mg", "5 days")];
    }

    if text.contains("diabetes") || text.contains("sugar") {
        return vec![Medicine::new("Metformin", "500 mg", "30 days")];
    }

    vec![Medicine::new("Multivitamin", "Once daily", "7 days")]
}
