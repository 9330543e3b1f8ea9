//! Worker state machine tests against scripted services

mod fixtures;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_test::assert_ok;

use fixtures::{FailingSink, FixedTokenCounter, MemorySink, ScriptedApiClient, VALID_RESPONSE};
use producer::{FailureKind, MockRecordSink, MockTokenCounter, PromptHandler, RetryPolicy, RetryRule, StopReason, Worker};
use shared::{ApiFailure, BudgetGuard, Category, CategoryWeights, ProcessId};

fn weights(pairs: &[(&str, i64)]) -> Arc<CategoryWeights> {
    Arc::new(CategoryWeights::from_pairs(pairs.iter().copied()).unwrap())
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(Duration::from_millis(1))
}

#[tokio::test]
async fn test_malformed_response_is_discarded_without_delay() {
    let client = Arc::new(ScriptedApiClient::new(
        vec![Ok("nonsense".to_string())],
        Ok(VALID_RESPONSE.to_string()),
    ));
    let sink = Arc::new(MemorySink::new());
    let budget = Arc::new(BudgetGuard::new(10));
    // a backoff here would take minutes
    let policy = RetryPolicy::new(Duration::from_secs(60));

    let worker = Worker::new(
        0,
        weights(&[("Science", 1)]),
        client.clone(),
        Arc::new(FixedTokenCounter(5)),
        sink.clone(),
        budget.clone(),
        policy,
    );
    let (_stop_tx, stop_rx) = watch::channel(false);

    let report = tokio::time::timeout(Duration::from_secs(5), worker.run(stop_rx))
        .await
        .expect("malformed response must not back off");

    assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
    assert_eq!(report.stats.malformed_discarded, 1);
    assert_eq!(report.stats.items_committed, 1);
    assert_eq!(client.calls(), 2);
    assert_eq!(sink.records().len(), 1);
    assert_eq!(budget.snapshot().await.spent, 10);
}

#[tokio::test]
async fn test_only_nonsense_never_touches_budget() {
    let client = Arc::new(ScriptedApiClient::always(Ok("nonsense".to_string())).with_latency(Duration::from_millis(1)));
    let sink = Arc::new(MemorySink::new());
    let budget = Arc::new(BudgetGuard::new(1_000));

    let worker = Worker::new(
        1,
        weights(&[("Math", 1)]),
        client.clone(),
        Arc::new(FixedTokenCounter(5)),
        sink.clone(),
        budget.clone(),
        fast_policy(),
    );
    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = tokio::spawn(worker.run(stop_rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_ok!(stop_tx.send(true));
    let report = handle.await.unwrap();

    assert_eq!(report.stop_reason, StopReason::ShutdownRequested);
    assert!(report.stats.malformed_discarded > 0);
    assert!(sink.records().is_empty());
    assert_eq!(budget.snapshot().await.spent, 0);
}

#[tokio::test]
async fn test_failures_back_off_and_continue() {
    let client = Arc::new(ScriptedApiClient::new(
        vec![
            Err(ApiFailure::RateLimitExceeded),
            Err(ApiFailure::ServiceError { status: 500, message: "boom".to_string() }),
            Err(ApiFailure::NetworkError("reset".to_string())),
            Ok(VALID_RESPONSE.to_string()),
        ],
        Ok(VALID_RESPONSE.to_string()),
    ));
    let sink = Arc::new(MemorySink::new());
    let budget = Arc::new(BudgetGuard::new(10));

    let worker = Worker::new(
        2,
        weights(&[("Coding", 2)]),
        client.clone(),
        Arc::new(FixedTokenCounter(5)),
        sink.clone(),
        budget,
        fast_policy(),
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = worker.run(stop_rx).await;

    assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
    assert_eq!(report.stats.rate_limited, 1);
    assert_eq!(report.stats.service_errors, 1);
    assert_eq!(report.stats.unknown_errors, 1);
    assert_eq!(report.stats.items_committed, 1);
    assert_eq!(client.calls(), 4);
    assert_eq!(sink.records()[0].category.as_str(), "Coding");
}

#[tokio::test]
async fn test_rejected_commit_stops_worker() {
    let sink = Arc::new(MemorySink::new());
    let budget = Arc::new(BudgetGuard::new(100));
    assert!(budget.try_commit(95).await);

    let worker = Worker::new(
        3,
        weights(&[("Medicine", 1)]),
        Arc::new(ScriptedApiClient::always_valid()),
        Arc::new(FixedTokenCounter(5)),
        sink.clone(),
        budget.clone(),
        fast_policy(),
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = worker.run(stop_rx).await;

    assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
    assert_eq!(report.stats.items_committed, 0);
    assert!(sink.records().is_empty());
    assert_eq!(budget.snapshot().await.spent, 95);
}

#[tokio::test]
async fn test_exhausted_budget_stops_before_any_request() {
    let client = Arc::new(ScriptedApiClient::always_valid());
    let budget = Arc::new(BudgetGuard::new(5));
    assert!(budget.try_commit(5).await);

    let worker = Worker::new(
        4,
        weights(&[("Math", 1)]),
        client.clone(),
        Arc::new(FixedTokenCounter(1)),
        Arc::new(MemorySink::new()),
        budget,
        fast_policy(),
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = worker.run(stop_rx).await;

    assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_stop_signal_interrupts_backoff() {
    let client = Arc::new(ScriptedApiClient::always(Err(ApiFailure::RateLimitExceeded)));
    let budget = Arc::new(BudgetGuard::new(1_000));

    let worker = Worker::new(
        5,
        weights(&[("Math", 1)]),
        client.clone(),
        Arc::new(FixedTokenCounter(1)),
        Arc::new(MemorySink::new()),
        budget,
        // 10 units of 10s each
        RetryPolicy::new(Duration::from_secs(10)),
    );
    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = tokio::spawn(worker.run(stop_rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_ok!(stop_tx.send(true));

    let report = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker should leave backoff on stop")
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::ShutdownRequested);
    assert_eq!(report.stats.rate_limited, 1);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_sink_failure_stops_without_spending() {
    let budget = Arc::new(BudgetGuard::new(100));

    let worker = Worker::new(
        6,
        weights(&[("Math", 1)]),
        Arc::new(ScriptedApiClient::always_valid()),
        Arc::new(FixedTokenCounter(3)),
        Arc::new(FailingSink),
        budget.clone(),
        fast_policy(),
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = worker.run(stop_rx).await;

    assert!(matches!(report.stop_reason, StopReason::SinkFailed(ref msg) if msg.contains("disk full")));
    assert_eq!(budget.snapshot().await.spent, 0);
    assert_eq!(report.stats.items_committed, 0);
}

#[tokio::test]
async fn test_abandoning_rule_stops_worker() {
    let policy = fast_policy().with_rule(FailureKind::Unknown, RetryRule { units: 0, should_continue: false });

    let worker = Worker::new(
        7,
        weights(&[("Math", 1)]),
        Arc::new(ScriptedApiClient::always(Err(ApiFailure::InvalidResponse("garbled".to_string())))),
        Arc::new(FixedTokenCounter(1)),
        Arc::new(MemorySink::new()),
        Arc::new(BudgetGuard::new(100)),
        policy,
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = worker.run(stop_rx).await;

    assert!(matches!(report.stop_reason, StopReason::RetryAbandoned(_)));
    assert_eq!(report.stats.unknown_errors, 1);
}

#[tokio::test]
async fn test_prompts_follow_proportional_schedule() {
    let client = Arc::new(ScriptedApiClient::always_valid());

    let worker = Worker::new(
        8,
        weights(&[("A", 3), ("B", 1)]),
        client.clone(),
        Arc::new(FixedTokenCounter(1)),
        Arc::new(MemorySink::new()),
        // 8 items at cost 2
        Arc::new(BudgetGuard::new(16)),
        fast_policy(),
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = worker.run(stop_rx).await;

    let order: Vec<&str> = client
        .prompts()
        .iter()
        .map(|p| if p.contains("**A**") { "A" } else { "B" })
        .collect();
    assert_eq!(order, vec!["A", "B", "A", "A", "A", "B", "A", "A"]);
    assert_eq!(report.stats.items_committed, 8);
}

#[tokio::test]
async fn test_cost_is_question_plus_answer_tokens() {
    let mut counter = MockTokenCounter::new();
    counter.expect_count().returning(|text| text.split_whitespace().count() as u64);

    let mut sink = MockRecordSink::new();
    sink.expect_append()
        .withf(|record| record.question == "Why is the sky blue?" && record.answer == "Rayleigh scattering of sunlight." && record.cost == 9)
        .times(1)
        .returning(|_| Ok(()));
    sink.expect_location().returning(|| "mock".to_string());

    let worker = Worker::new(
        9,
        weights(&[("Science", 1)]),
        Arc::new(ScriptedApiClient::always(Ok(
            "Q: Why is the sky blue?\nA: Rayleigh scattering of sunlight.".to_string(),
        ))),
        Arc::new(counter),
        Arc::new(sink),
        Arc::new(BudgetGuard::new(9)),
        fast_policy(),
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = worker.run(stop_rx).await;

    assert_eq!(report.stats.tokens_committed, 9);
    assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
}

#[tokio::test]
async fn test_custom_prompt_handler_names_dataset() {
    let client = Arc::new(ScriptedApiClient::always_valid());
    let sink = Arc::new(MemorySink::new());

    let worker = Worker::new(
        3,
        weights(&[("History", 1)]),
        client.clone(),
        Arc::new(FixedTokenCounter(5)),
        sink.clone(),
        Arc::new(BudgetGuard::new(20)),
        fast_policy(),
    )
    .with_prompt_handler(PromptHandler::with_dataset_name("Archive-QA"));

    assert_eq!(worker.id(), ProcessId::Worker(3));
    assert_eq!(worker.local_counts().get(&Category::from("History")), 0);
    assert_eq!(worker.local_counts().total(), 0);

    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = worker.run(stop_rx).await;

    assert_eq!(report.worker, ProcessId::Worker(3));
    assert_eq!(report.stats.items_committed, 2);
    assert_eq!(sink.records().len(), 2);
    let prompts = client.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts.iter().all(|p| p.contains("'Archive-QA'") && p.contains("**History**")));
}
