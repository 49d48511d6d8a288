use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;

use billing_cell::*;
use shared_config::AppConfig;
use shared_database::{tables, MemoryStore, RecordStore, SharedStore};
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, TestConfig};

async fn store_with_patient() -> (SharedStore, i64) {
    let store: SharedStore = Arc::new(MemoryStore::clinic());
    let patient = store
        .insert(tables::PATIENTS, json!({"name": "Mei Chen"}))
        .await
        .unwrap();
    (store, patient["id"].as_i64().unwrap())
}

fn bill(patient_id: i64, amount: f64, status: Option<&str>) -> CreateBillRequest {
    CreateBillRequest {
        patient_id,
        amount,
        status: status.map(str::to_string),
    }
}

#[tokio::test]
async fn test_create_bill_defaults_to_unpaid() {
    let (store, patient_id) = store_with_patient().await;
    let service = BillingService::new(store);

    let created = assert_ok!(service.create_bill(bill(patient_id, 450.0, None)).await);

    assert_eq!(created.status, BillStatus::Unpaid);
    assert_eq!(created.amount, 450.0);
    assert_eq!(service.get_bill(created.id).await.unwrap(), created);
}

#[tokio::test]
async fn test_create_bill_rejects_bad_input() {
    let (store, patient_id) = store_with_patient().await;
    let service = BillingService::new(store);

    assert_matches!(
        service.create_bill(bill(patient_id, -1.0, None)).await,
        Err(AppError::ValidationError(_))
    );
    assert_matches!(
        service.create_bill(bill(patient_id, f64::INFINITY, None)).await,
        Err(AppError::ValidationError(_))
    );
    assert_matches!(
        service.create_bill(bill(patient_id, 10.0, Some("refunded"))).await,
        Err(AppError::BadRequest(_))
    );
    assert_matches!(
        service.create_bill(bill(patient_id + 9, 10.0, None)).await,
        Err(AppError::NotFound(_))
    );
}

#[tokio::test]
async fn test_bills_listed_newest_first_and_toggle_status() {
    let (store, patient_id) = store_with_patient().await;
    let service = BillingService::new(store);

    let older = service.create_bill(bill(patient_id, 100.0, Some("paid"))).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = service.create_bill(bill(patient_id, 0.0, None)).await.unwrap();

    let ids: Vec<i64> = service
        .get_patient_bills(patient_id)
        .await
        .unwrap()
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let paid = service.update_status(newer.id, BillStatus::Paid).await.unwrap();
    assert_eq!(paid.status, BillStatus::Paid);
    let unpaid = service.update_status(older.id, BillStatus::Unpaid).await.unwrap();
    assert_eq!(unpaid.status, BillStatus::Unpaid);

    assert_matches!(service.update_status(999, BillStatus::Paid).await, Err(AppError::NotFound(_)));
}

async fn send(router: &Router, config: &AppConfig, method: &str, uri: &str, body: Option<Value>) -> StatusCode {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", JwtTestUtils::bearer_header(config));
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    router.clone().oneshot(builder.body(body).unwrap()).await.unwrap().status()
}

#[tokio::test]
async fn test_billing_routes() {
    let (store, patient_id) = store_with_patient().await;
    let config = TestConfig::default().to_app_config();
    let router = billing_routes(Arc::new(config.clone()), store);

    let status = send(&router, &config, "POST", "/", Some(json!({"patient_id": patient_id, "amount": 250.5}))).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(send(&router, &config, "PATCH", "/1", Some(json!({"status": "paid"}))).await, StatusCode::OK);
    assert_eq!(send(&router, &config, "PATCH", "/1", Some(json!({"status": "void"}))).await, StatusCode::BAD_REQUEST);
    assert_eq!(send(&router, &config, "GET", &format!("/patient/{}", patient_id), None).await, StatusCode::OK);
    assert_eq!(send(&router, &config, "DELETE", "/1", None).await, StatusCode::NO_CONTENT);
    assert_eq!(send(&router, &config, "GET", "/1", None).await, StatusCode::NOT_FOUND);
}
