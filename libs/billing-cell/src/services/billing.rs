use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::{tables, Query, SharedStore, SortOrder};
use shared_models::error::AppError;

use crate::models::{Bill, BillStatus, CreateBillRequest};

pub struct BillingService {
    store: SharedStore,
}

impl BillingService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_bill(&self, request: CreateBillRequest) -> Result<Bill, AppError> {
        if !request.amount.is_finite() || request.amount < 0.0 {
            return Err(AppError::ValidationError(format!(
                "Amount must be a non-negative number, got {}",
                request.amount
            )));
        }

        let status = match request.status.as_deref() {
            Some(raw) => raw.parse::<BillStatus>()?,
            None => BillStatus::default(),
        };

        if self.store.find_by_id(tables::PATIENTS, request.patient_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Patient not found: {}", request.patient_id)));
        }

        let record = json!({
            "patient_id": request.patient_id,
            "amount": request.amount,
            "status": status,
            "created_at": Utc::now(),
        });

        let row = self
            .store
            .insert_child(tables::BILLING, record, tables::PATIENTS, "patient_id")
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Patient not found: {}", request.patient_id)))?;
        let bill = parse(row)?;

        info!("Bill {} of {:.2} raised for patient {}", bill.id, bill.amount, bill.patient_id);
        Ok(bill)
    }

    pub async fn get_patient_bills(&self, patient_id: i64) -> Result<Vec<Bill>, AppError> {
        debug!("Fetching bills for patient {}", patient_id);

        let rows = self
            .store
            .find(
                tables::BILLING,
                &Query::all()
                    .filter_eq("patient_id", patient_id)
                    .order_by("created_at", SortOrder::Desc),
            )
            .await?;

        rows.into_iter().map(parse).collect()
    }

    pub async fn get_bill(&self, bill_id: i64) -> Result<Bill, AppError> {
        let row = self
            .store
            .find_by_id(tables::BILLING, bill_id)
            .await?
            .ok_or_else(|| not_found(bill_id))?;

        parse(row)
    }

    /// Bills move freely between unpaid and paid.
    pub async fn update_status(&self, bill_id: i64, status: BillStatus) -> Result<Bill, AppError> {
        let row = self
            .store
            .update(tables::BILLING, bill_id, json!({ "status": status }))
            .await?
            .ok_or_else(|| not_found(bill_id))?;

        info!("Bill {} marked {}", bill_id, status);
        parse(row)
    }

    pub async fn delete_bill(&self, bill_id: i64) -> Result<(), AppError> {
        if !self.store.delete(tables::BILLING, bill_id).await? {
            return Err(not_found(bill_id));
        }

        info!("Deleted bill {}", bill_id);
        Ok(())
    }

    pub async fn delete_patient_bills(&self, patient_id: i64) -> Result<u64, AppError> {
        Ok(self
            .store
            .delete_where(tables::BILLING, "patient_id", json!(patient_id))
            .await?)
    }
}

fn parse(row: Value) -> Result<Bill, AppError> {
    serde_json::from_value(row).map_err(|e| AppError::Internal(format!("Malformed bill row: {}", e)))
}

fn not_found(bill_id: i64) -> AppError {
    AppError::NotFound(format!("Bill not found: {}", bill_id))
}
