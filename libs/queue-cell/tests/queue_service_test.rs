use std::sync::Arc;

use assert_matches::assert_matches;
use futures::future::join_all;
use serde_json::json;

use queue_cell::*;
use shared_config::AppConfig;
use shared_database::{tables, MemoryStore, RecordStore, SharedStore};

fn setup() -> (Arc<QueueService>, SharedStore) {
    let store: SharedStore = Arc::new(MemoryStore::clinic());
    let service = Arc::new(QueueService::new(&AppConfig::default(), store.clone()));
    (service, store)
}

async fn book_appointments(store: &SharedStore, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for hour in 0..count {
        let row = store
            .insert(
                tables::APPOINTMENTS,
                json!({
                    "patient_id": 1,
                    "appointment_time": format!("2025-06-01T{:02}:00:00Z", hour % 24),
                    "status": "scheduled"
                }),
            )
            .await
            .unwrap();
        ids.push(row["id"].as_i64().unwrap());
    }
    ids
}

fn numbers(tokens: &[QueueToken]) -> Vec<i64> {
    tokens.iter().map(|t| t.token_number).collect()
}

#[tokio::test]
async fn test_sequential_enqueue_issues_consecutive_tickets() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 5).await;

    let mut issued = Vec::new();
    for id in &appointments {
        let token = service.enqueue(*id).await.unwrap();
        assert_eq!(token.status, QueueStatus::Waiting);
        assert_eq!(token.appointment_id, *id);
        issued.push(token.token_number);
    }

    assert_eq!(issued, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_enqueue_unknown_appointment_creates_nothing() {
    let (service, _store) = setup();

    let result = service.enqueue(404).await;

    assert_matches!(result, Err(QueueError::AppointmentNotFound(404)));
    assert!(service.list_queue().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_removed_ticket_is_not_reissued() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 3).await;

    let first = service.enqueue(appointments[0]).await.unwrap();
    let second = service.enqueue(appointments[1]).await.unwrap();
    assert_eq!((first.token_number, second.token_number), (1, 2));

    service.remove(first.token_id).await.unwrap();
    let third = service.enqueue(appointments[2]).await.unwrap();

    assert_eq!(third.token_number, 3);
}

#[tokio::test]
async fn test_removing_highest_ticket_does_not_rewind_sequence() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 3).await;

    service.enqueue(appointments[0]).await.unwrap();
    let second = service.enqueue(appointments[1]).await.unwrap();
    service.remove(second.token_id).await.unwrap();

    let third = service.enqueue(appointments[2]).await.unwrap();
    assert_eq!(third.token_number, 3);
}

#[tokio::test]
async fn test_list_queue_sorted_after_deletions() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 6).await;

    let mut tokens = Vec::new();
    for id in &appointments[..4] {
        tokens.push(service.enqueue(*id).await.unwrap());
    }
    service.remove(tokens[1].token_id).await.unwrap();
    service.remove(tokens[3].token_id).await.unwrap();
    service.enqueue(appointments[4]).await.unwrap();
    service.enqueue(appointments[5]).await.unwrap();

    let queue = service.list_queue().await.unwrap();
    assert_eq!(numbers(&queue), vec![1, 3, 5, 6]);
}

#[tokio::test]
async fn test_update_status_on_missing_token() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 1).await;

    let token = service.enqueue(appointments[0]).await.unwrap();
    service.remove(token.token_id).await.unwrap();

    assert_matches!(
        service.update_status(token.token_id, QueueStatus::Done).await,
        Err(QueueError::TokenNotFound(id)) if id == token.token_id
    );
    assert_matches!(
        service.update_status(999, QueueStatus::InProgress).await,
        Err(QueueError::TokenNotFound(999))
    );
    assert_matches!(service.remove(token.token_id).await, Err(QueueError::TokenNotFound(_)));
}

#[tokio::test]
async fn test_update_status_touches_only_target_token() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 3).await;
    for id in &appointments {
        service.enqueue(*id).await.unwrap();
    }
    let before = service.list_queue().await.unwrap();

    let updated = service.update_status(before[1].token_id, QueueStatus::Done).await.unwrap();
    assert_eq!(updated.status, QueueStatus::Done);

    let after = service.list_queue().await.unwrap();
    assert_eq!(after[1].status, QueueStatus::Done);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
}

#[tokio::test]
async fn test_done_tokens_cannot_return_to_waiting() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 1).await;
    let token = service.enqueue(appointments[0]).await.unwrap();

    service.update_status(token.token_id, QueueStatus::InProgress).await.unwrap();
    service.update_status(token.token_id, QueueStatus::Done).await.unwrap();

    assert_matches!(
        service.update_status(token.token_id, QueueStatus::Waiting).await,
        Err(QueueError::InvalidStatusTransition { .. })
    );
}

#[tokio::test]
async fn test_appointment_checks_in_once() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 1).await;

    service.enqueue(appointments[0]).await.unwrap();

    assert_matches!(
        service.enqueue(appointments[0]).await,
        Err(QueueError::AlreadyQueued(id)) if id == appointments[0]
    );
    assert_eq!(service.list_queue().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enqueue_yields_distinct_tickets() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 2).await;

    let (a, b) = tokio::join!(service.enqueue(appointments[0]), service.enqueue(appointments[1]));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.token_number, b.token_number);
    let mut pair = vec![a.token_number, b.token_number];
    pair.sort();
    assert_eq!(pair, vec![1, 2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_check_ins_have_no_gaps() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 25).await;

    let handles = appointments.iter().map(|id| {
        let service = service.clone();
        let id = *id;
        tokio::spawn(async move { service.enqueue(id).await })
    });

    let mut issued: Vec<i64> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().token_number)
        .collect();
    issued.sort();

    assert_eq!(issued, (1..=25).collect::<Vec<_>>());
    assert_eq!(numbers(&service.list_queue().await.unwrap()), issued);
}

#[tokio::test]
async fn test_position_counts_active_tokens_ahead() {
    let (service, store) = setup();
    let appointments = book_appointments(&store, 4).await;
    let mut tokens = Vec::new();
    for id in &appointments {
        tokens.push(service.enqueue(*id).await.unwrap());
    }
    service.update_status(tokens[0].token_id, QueueStatus::Done).await.unwrap();
    service.update_status(tokens[1].token_id, QueueStatus::InProgress).await.unwrap();

    let position = service.position(tokens[3].token_id).await.unwrap();
    assert_eq!(position.position, Some(3));
    assert_eq!(position.ahead, 2);
    assert_eq!(position.estimated_wait_minutes, Some(20));

    let finished = service.position(tokens[0].token_id).await.unwrap();
    assert_eq!(finished.position, None);
    assert_eq!(finished.estimated_wait_minutes, None);

    assert_matches!(service.position(77).await, Err(QueueError::TokenNotFound(77)));
}

#[tokio::test]
async fn test_summary_counts_statuses() {
    let (service, store) = setup();
    assert_eq!(service.summary().await.unwrap(), QueueSummary::default());

    let appointments = book_appointments(&store, 3).await;
    let mut tokens = Vec::new();
    for id in &appointments {
        tokens.push(service.enqueue(*id).await.unwrap());
    }
    service.update_status(tokens[0].token_id, QueueStatus::Done).await.unwrap();
    service.update_status(tokens[1].token_id, QueueStatus::InProgress).await.unwrap();

    let summary = service.summary().await.unwrap();
    assert_eq!(summary.waiting, 1);
    assert_eq!(summary.in_progress, 1);
    assert_eq!(summary.done, 1);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.last_token_number, Some(3));
}
