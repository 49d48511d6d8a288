use regex::Regex;
use tracing::warn;

use crate::models::{CreatePatientRequest, PatientError};

const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 \-]*[0-9]$";
const PHONE_LENGTH: std::ops::RangeInclusive<usize> = 6..=20;
const AGE_RANGE: std::ops::RangeInclusive<i32> = 0..=150;

/// Normalizes and checks patient registrations.
pub struct PatientValidator {
    phone_pattern: Option<Regex>,
}

impl Default for PatientValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientValidator {
    pub fn new() -> Self {
        let phone_pattern = Regex::new(PHONE_PATTERN)
            .map_err(|e| warn!("Phone pattern failed to compile, format checks disabled: {}", e))
            .ok();

        Self { phone_pattern }
    }

    /// Trims text fields, turning blank optionals into `None`, then checks
    /// the result.
    pub fn normalize(&self, request: CreatePatientRequest) -> Result<CreatePatientRequest, PatientError> {
        let normalized = CreatePatientRequest {
            name: request.name.trim().to_string(),
            age: request.age,
            gender: non_blank(request.gender),
            phone: non_blank(request.phone),
        };

        self.validate(&normalized)?;
        Ok(normalized)
    }

    pub fn validate(&self, request: &CreatePatientRequest) -> Result<(), PatientError> {
        if request.name.trim().is_empty() {
            return Err(PatientError::ValidationError("Name must not be empty".to_string()));
        }

        if let Some(age) = request.age {
            if !AGE_RANGE.contains(&age) {
                return Err(PatientError::ValidationError(format!(
                    "Age must be between 0 and 150, got {}",
                    age
                )));
            }
        }

        if let Some(phone) = &request.phone {
            if !self.validate_phone(phone) {
                return Err(PatientError::ValidationError(format!("Invalid phone number: {}", phone)));
            }
        }

        Ok(())
    }

    pub fn validate_phone(&self, phone: &str) -> bool {
        if !PHONE_LENGTH.contains(&phone.chars().count()) {
            return false;
        }

        match &self.phone_pattern {
            Some(pattern) => pattern.is_match(phone),
            None => true,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
