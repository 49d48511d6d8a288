use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_database::{tables, Query, SharedStore, SortOrder};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, CreateAppointmentRequest};

pub struct AppointmentService {
    store: SharedStore,
}

impl AppointmentService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking appointment for patient {} at {}", request.patient_id, request.appointment_time);

        if self.store.find_by_id(tables::PATIENTS, request.patient_id).await?.is_none() {
            return Err(AppointmentError::PatientNotFound(request.patient_id));
        }

        let record = json!({
            "patient_id": request.patient_id,
            "appointment_time": request.appointment_time,
            "status": AppointmentStatus::Scheduled,
            "created_at": Utc::now(),
        });

        let row = self
            .store
            .insert_child(tables::APPOINTMENTS, record, tables::PATIENTS, "patient_id")
            .await?
            .ok_or(AppointmentError::PatientNotFound(request.patient_id))?;
        let appointment: Appointment = serde_json::from_value(row)?;

        info!("Appointment {} booked for patient {}", appointment.id, appointment.patient_id);
        Ok(appointment)
    }

    /// All appointments, latest scheduled time first.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, AppointmentError> {
        let rows = self
            .store
            .find(
                tables::APPOINTMENTS,
                &Query::all().order_by("appointment_time", SortOrder::Desc),
            )
            .await?;

        parse_rows(rows)
    }

    pub async fn get_patient_appointments(&self, patient_id: i64) -> Result<Vec<Appointment>, AppointmentError> {
        let rows = self
            .store
            .find(
                tables::APPOINTMENTS,
                &Query::all()
                    .filter_eq("patient_id", patient_id)
                    .order_by("appointment_time", SortOrder::Desc),
            )
            .await?;

        parse_rows(rows)
    }

    pub async fn get_appointment(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        let row = self
            .store
            .find_by_id(tables::APPOINTMENTS, appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))?;

        Ok(serde_json::from_value(row)?)
    }

    pub async fn update_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id).await?;

        if !current.status.can_transition_to(&status) {
            warn!("Invalid status transition attempted: {} -> {}", current.status, status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current.status,
                to: status,
            });
        }

        let row = self
            .store
            .update(tables::APPOINTMENTS, appointment_id, json!({ "status": status }))
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))?;

        info!("Appointment {} status: {} -> {}", appointment_id, current.status, status);
        Ok(serde_json::from_value(row)?)
    }

    /// Deletes the appointment together with its queue token.
    ///
    /// The appointment goes first: from then on the store refuses new tokens
    /// for it, so sweeping its tokens afterwards leaves none behind.
    pub async fn delete_appointment(&self, appointment_id: i64) -> Result<(), AppointmentError> {
        if !self.store.delete(tables::APPOINTMENTS, appointment_id).await? {
            return Err(AppointmentError::NotFound(appointment_id));
        }

        let tokens = self.delete_queue_tokens(appointment_id).await?;

        info!("Deleted appointment {} ({} queue token(s))", appointment_id, tokens);
        Ok(())
    }

    /// Deletes every appointment of a patient and their queue tokens.
    /// Returns the number of appointments removed. Call it after the patient
    /// row is gone so no appointment can be booked behind the sweep.
    pub async fn delete_patient_appointments(&self, patient_id: i64) -> Result<u64, AppointmentError> {
        let mut removed = 0;

        for appointment in self.get_patient_appointments(patient_id).await? {
            if self.store.delete(tables::APPOINTMENTS, appointment.id).await? {
                removed += 1;
            }
            self.delete_queue_tokens(appointment.id).await?;
        }

        debug!("Removed {} appointment(s) of patient {}", removed, patient_id);
        Ok(removed)
    }

    async fn delete_queue_tokens(&self, appointment_id: i64) -> Result<u64, AppointmentError> {
        Ok(self
            .store
            .delete_where(tables::QUEUE_TOKENS, "appointment_id", json!(appointment_id))
            .await?)
    }
}

fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, AppointmentError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(AppointmentError::from))
        .collect()
}
