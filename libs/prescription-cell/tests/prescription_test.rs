use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use prescription_cell::*;
use shared_database::{tables, MemoryStore, RecordStore, SharedStore};
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, TestConfig};

async fn store_with_patient() -> (SharedStore, i64) {
    let store: SharedStore = Arc::new(MemoryStore::clinic());
    let patient = store
        .insert(tables::PATIENTS, json!({"name": "Tomas Berg"}))
        .await
        .unwrap();
    (store, patient["id"].as_i64().unwrap())
}

fn request(patient_id: i64, diagnosis: &str) -> CreatePrescriptionRequest {
    CreatePrescriptionRequest {
        patient_id,
        diagnosis: diagnosis.to_string(),
        medicines: vec![
            MedicineEntry::Name("Paracetamol 650mg".to_string()),
            MedicineEntry::Detailed(Medicine::new("ORS", "After meals", "3 days")),
        ],
        notes: Some("Hydrate".to_string()),
    }
}

#[tokio::test]
async fn test_create_and_list_newest_first() {
    let (store, patient_id) = store_with_patient().await;
    let service = PrescriptionService::new(store);

    let first = service.create_prescription(request(patient_id, "Viral fever")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = service.create_prescription(request(patient_id, "  Migraine ")).await.unwrap();

    assert_eq!(second.diagnosis, "Migraine");
    assert_eq!(first.medicines.len(), 2);

    let listed = service.get_patient_prescriptions(patient_id).await.unwrap();
    let ids: Vec<i64> = listed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(service.get_patient_prescriptions(patient_id + 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_validates_input() {
    let (store, patient_id) = store_with_patient().await;
    let service = PrescriptionService::new(store);

    assert_matches!(
        service.create_prescription(request(patient_id, "   ")).await,
        Err(AppError::ValidationError(_))
    );
    assert_matches!(
        service.create_prescription(request(patient_id + 100, "Cough")).await,
        Err(AppError::NotFound(_))
    );
}

#[tokio::test]
async fn test_delete_prescription() {
    let (store, patient_id) = store_with_patient().await;
    let service = PrescriptionService::new(store);
    let prescription = service.create_prescription(request(patient_id, "Cough")).await.unwrap();

    service.delete_prescription(prescription.id).await.unwrap();

    assert_matches!(service.get_prescription(prescription.id).await, Err(AppError::NotFound(_)));
    assert_matches!(service.delete_prescription(prescription.id).await, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_routes_round_trip_mixed_medicines() {
    let (store, patient_id) = store_with_patient().await;
    let config = TestConfig::default().to_app_config();
    let router = prescription_routes(Arc::new(config.clone()), store);

    let body = json!({
        "patient_id": patient_id,
        "diagnosis": "Back pain",
        "medicines": ["Rest", {"name": "Ibuprofen", "dosage": "400 mg", "duration": "5 days"}]
    });
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("authorization", JwtTestUtils::bearer_header(&config))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/patient/{}", patient_id))
                .header("authorization", JwtTestUtils::bearer_header(&config))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let listed: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listed[0]["medicines"][0], "Rest");
    assert_eq!(listed[0]["medicines"][1]["dosage"], "400 mg");
    assert!(listed[0]["notes"].is_null());
}
