use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::{AppConfig, StoreBackend};
use shared_database::postgrest::PAGE_SIZE;
use shared_database::{Query, RecordStore, SortOrder, StoreError, SupabaseStore};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        store_backend: StoreBackend::Supabase,
        supabase_url: server.uri(),
        supabase_api_key: "service-key".to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn insert_returns_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .and(header("apikey", "service-key"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!({"name": "Asha"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 4, "name": "Asha"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let row = store.insert("patients", json!({"name": "Asha"})).await.unwrap();

    assert_eq!(row["id"], 4);
}

#[tokio::test]
async fn unique_violation_is_reported_with_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/queue_tokens"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "details": "Key (token_number)=(2) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"queue_tokens_token_number_key\""
        })))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store
        .insert("queue_tokens", json!({"appointment_id": 1, "token_number": 2}))
        .await;

    assert_matches!(result, Err(StoreError::UniqueViolation { ref table, ref field })
        if table == "queue_tokens" && field == "token_number");
}

#[tokio::test]
async fn find_sends_filters_and_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/billing"))
        .and(query_param("patient_id", "eq.3"))
        .and(query_param("order", "created_at.desc,id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "patient_id": 3},
            {"id": 8, "patient_id": 3}
        ])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let query = Query::all()
        .filter_eq("patient_id", 3)
        .order_by("created_at", SortOrder::Desc);
    let rows = store.find("billing", &query).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], 9);
}

#[tokio::test]
async fn find_by_id_and_delete_handle_missing_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));

    assert!(store.find_by_id("appointments", 42).await.unwrap().is_none());
    assert!(!store.delete("appointments", 42).await.unwrap());
}

#[tokio::test]
async fn update_strips_id_from_changes() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/queue_tokens"))
        .and(query_param("id", "eq.2"))
        .and(body_json(json!({"status": "done"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "token_number": 2, "appointment_id": 5, "status": "done"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let row = store
        .update("queue_tokens", 2, json!({"id": 77, "status": "done"}))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(row["status"], "done");
}

#[tokio::test]
async fn sequence_and_max_use_rpc_and_ordering() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/next_sequence_value"))
        .and(body_json(json!({"seq_table": "queue_tokens", "seq_field": "token_number"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(17)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_tokens"))
        .and(query_param("select", "token_number"))
        .and(query_param("order", "token_number.desc"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"token_number": 16}
        ])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));

    assert_eq!(store.next_sequence("queue_tokens", "token_number").await.unwrap(), 17);
    assert_eq!(store.max_value("queue_tokens", "token_number").await.unwrap(), Some(16));
}

#[tokio::test]
async fn server_errors_become_backend_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store.find("patients", &Query::all()).await;

    assert_matches!(result, Err(StoreError::Backend(msg)) if msg.contains("500"));
}

#[tokio::test]
async fn find_follows_pages_past_row_cap() {
    let server = MockServer::start().await;
    let capped: Vec<_> = (1..=PAGE_SIZE as i64)
        .map(|n| json!({"id": n, "token_number": n, "status": "done"}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_tokens"))
        .and(query_param("order", "token_number.asc,id.asc"))
        .and(query_param("limit", PAGE_SIZE.to_string()))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(capped))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_tokens"))
        .and(query_param("offset", PAGE_SIZE.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1001, "token_number": 1001, "status": "waiting"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let rows = store
        .find("queue_tokens", &Query::all().order_by("token_number", SortOrder::Asc))
        .await
        .unwrap();

    assert_eq!(rows.len(), PAGE_SIZE + 1);
    assert_eq!(rows.last().unwrap()["token_number"], 1001);
}

#[tokio::test]
async fn insert_child_reports_missing_parent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/queue_tokens"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "details": "Key (appointment_id)=(9) is not present in table \"appointments\".",
            "hint": null,
            "message": "insert or update on table \"queue_tokens\" violates foreign key constraint"
        })))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store
        .insert_child(
            "queue_tokens",
            json!({"appointment_id": 9, "token_number": 1}),
            "appointments",
            "appointment_id",
        )
        .await
        .unwrap();

    assert!(result.is_none());
}
