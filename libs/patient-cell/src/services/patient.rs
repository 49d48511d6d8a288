use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use appointment_cell::{Appointment, AppointmentService};
use billing_cell::BillingService;
use prescription_cell::PrescriptionService;
use shared_database::{tables, Query, SharedStore, SortOrder};

use crate::models::{CreatePatientRequest, Patient, PatientError, PatientSummary};
use crate::services::PatientValidator;

/// Patient records plus the views and cascades that span the other cells.
pub struct PatientService {
    store: SharedStore,
    validator: PatientValidator,
    appointments: AppointmentService,
    prescriptions: PrescriptionService,
    billing: BillingService,
}

impl PatientService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            validator: PatientValidator::new(),
            appointments: AppointmentService::new(store.clone()),
            prescriptions: PrescriptionService::new(store.clone()),
            billing: BillingService::new(store.clone()),
            store,
        }
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        let request = self.validator.normalize(request)?;
        debug!("Registering patient: {}", request.name);

        let record = json!({
            "name": request.name,
            "age": request.age,
            "gender": request.gender,
            "phone": request.phone,
            "created_at": Utc::now(),
        });

        let row = self.store.insert(tables::PATIENTS, record).await?;
        let patient: Patient = serde_json::from_value(row)?;

        info!("Patient {} registered", patient.id);
        Ok(patient)
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, PatientError> {
        let rows = self
            .store
            .find(tables::PATIENTS, &Query::all().order_by("id", SortOrder::Asc))
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(PatientError::from))
            .collect()
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Patient, PatientError> {
        let row = self
            .store
            .find_by_id(tables::PATIENTS, patient_id)
            .await?
            .ok_or(PatientError::NotFound(patient_id))?;

        Ok(serde_json::from_value(row)?)
    }

    /// Removes the patient with their appointments (and queue tokens),
    /// prescriptions and bills.
    ///
    /// The patient row goes first; the store then refuses new child records
    /// for it, so the sweeps below see every record that will ever exist.
    pub async fn delete_patient(&self, patient_id: i64) -> Result<(), PatientError> {
        if !self.store.delete(tables::PATIENTS, patient_id).await? {
            return Err(PatientError::NotFound(patient_id));
        }

        let appointments = self.appointments.delete_patient_appointments(patient_id).await?;
        let prescriptions = self.prescriptions.delete_patient_prescriptions(patient_id).await?;
        let bills = self.billing.delete_patient_bills(patient_id).await?;

        info!(
            "Deleted patient {} with {} appointment(s), {} prescription(s), {} bill(s)",
            patient_id, appointments, prescriptions, bills
        );
        Ok(())
    }

    pub async fn get_patient_appointments(&self, patient_id: i64) -> Result<Vec<Appointment>, PatientError> {
        self.get_patient(patient_id).await?;
        Ok(self.appointments.get_patient_appointments(patient_id).await?)
    }

    pub async fn get_patient_summary(&self, patient_id: i64) -> Result<PatientSummary, PatientError> {
        let patient = self.get_patient(patient_id).await?;

        Ok(PatientSummary {
            appointments: self.appointments.get_patient_appointments(patient_id).await?,
            prescriptions: self.prescriptions.get_patient_prescriptions(patient_id).await?,
            bills: self.billing.get_patient_bills(patient_id).await?,
            patient,
        })
    }
}
