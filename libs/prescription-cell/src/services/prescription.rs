use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::{tables, Query, SharedStore, SortOrder};
use shared_models::error::AppError;

use crate::models::{CreatePrescriptionRequest, Prescription};

pub struct PrescriptionService {
    store: SharedStore,
}

impl PrescriptionService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_prescription(&self, request: CreatePrescriptionRequest) -> Result<Prescription, AppError> {
        let diagnosis = request.diagnosis.trim();
        if diagnosis.is_empty() {
            return Err(AppError::ValidationError("Diagnosis must not be empty".to_string()));
        }

        if self.store.find_by_id(tables::PATIENTS, request.patient_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Patient not found: {}", request.patient_id)));
        }

        let record = json!({
            "patient_id": request.patient_id,
            "diagnosis": diagnosis,
            "medicines": request.medicines,
            "notes": request.notes,
            "created_at": Utc::now(),
        });

        let row = self
            .store
            .insert_child(tables::PRESCRIPTIONS, record, tables::PATIENTS, "patient_id")
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Patient not found: {}", request.patient_id)))?;
        let prescription = parse(row)?;

        info!(
            "Saved prescription {} for patient {} ({} medicine(s))",
            prescription.id,
            prescription.patient_id,
            prescription.medicines.len()
        );
        Ok(prescription)
    }

    /// Newest first.
    pub async fn get_patient_prescriptions(&self, patient_id: i64) -> Result<Vec<Prescription>, AppError> {
        debug!("Fetching prescriptions for patient {}", patient_id);

        let rows = self
            .store
            .find(
                tables::PRESCRIPTIONS,
                &Query::all()
                    .filter_eq("patient_id", patient_id)
                    .order_by("created_at", SortOrder::Desc),
            )
            .await?;

        rows.into_iter().map(parse).collect()
    }

    pub async fn get_prescription(&self, prescription_id: i64) -> Result<Prescription, AppError> {
        let row = self
            .store
            .find_by_id(tables::PRESCRIPTIONS, prescription_id)
            .await?
            .ok_or_else(|| not_found(prescription_id))?;

        parse(row)
    }

    pub async fn delete_prescription(&self, prescription_id: i64) -> Result<(), AppError> {
        if !self.store.delete(tables::PRESCRIPTIONS, prescription_id).await? {
            return Err(not_found(prescription_id));
        }

        info!("Deleted prescription {}", prescription_id);
        Ok(())
    }

    pub async fn delete_patient_prescriptions(&self, patient_id: i64) -> Result<u64, AppError> {
        Ok(self
            .store
            .delete_where(tables::PRESCRIPTIONS, "patient_id", json!(patient_id))
            .await?)
    }
}

fn parse(row: Value) -> Result<Prescription, AppError> {
    serde_json::from_value(row).map_err(|e| AppError::Internal(format!("Malformed prescription row: {}", e)))
}

fn not_found(prescription_id: i64) -> AppError {
    AppError::NotFound(format!("Prescription not found: {}", prescription_id))
}
