//! Dispatcher tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use junops::dispatch::{dispatch, map_concurrently, DispatchOptions};
use junops::tasks::{FactsTask, TaskParameters, TaskResult};

use crate::common::{input, FakeConnector, FakeDevice};

#[tokio::test]
async fn test_map_concurrently_keeps_input_order() {
    // Later items finish first
    let items: Vec<u64> = (0..8).collect();
    let results = map_concurrently(items, 8, |i| async move {
        tokio::time::sleep(Duration::from_millis((8 - i) * 5)).await;
        i * 10
    })
    .await;

    let values: Vec<u64> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(values, vec![0, 10, 20, 30, 40, 50, 60, 70]);
}

#[tokio::test]
async fn test_map_concurrently_respects_bound() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (f_in_flight, f_peak) = (Arc::clone(&in_flight), Arc::clone(&peak));
    let results = map_concurrently((0..12).collect::<Vec<usize>>(), 3, move |i| {
        let in_flight = Arc::clone(&f_in_flight);
        let peak = Arc::clone(&f_peak);
        async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            i
        }
    })
    .await;

    assert_eq!(results.len(), 12);
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_map_concurrently_isolates_panics() {
    let results = map_concurrently(vec![1, 2, 3], 2, |i| async move {
        if i == 2 {
            panic!("boom");
        }
        i
    })
    .await;

    assert_eq!(results[0].as_ref().ok(), Some(&1));
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().ok(), Some(&3));
}

#[tokio::test]
async fn test_map_concurrently_clamps_concurrency() {
    let results = map_concurrently(vec![1, 2, 3], usize::MAX, |i| async move { i * 2 }).await;
    let values: Vec<i32> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(values, vec![2, 4, 6]);

    let results = map_concurrently(vec![7], 0, |i| async move { i }).await;
    assert_eq!(results[0].as_ref().ok(), Some(&7));
}

#[tokio::test]
async fn test_map_concurrently_empty() {
    let results = map_concurrently(Vec::<u8>::new(), 4, |i| async move { i }).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_dispatch_one_unreachable_among_reachable() {
    let connector = Arc::new(
        FakeConnector::new()
            .with("r1", FakeDevice::up_after("r1", Duration::from_millis(20)))
            .with("r3", FakeDevice::up("r3"))
            .with("r4", FakeDevice::up_after("r4", Duration::from_millis(5))),
    );
    let inputs = vec![
        input("r1", 22, TaskParameters::default()),
        input("r2", 22, TaskParameters::default()),
        input("r3", 830, TaskParameters::default()),
        input("r4", 22, TaskParameters::default()),
    ];

    let results = dispatch(
        Arc::new(FactsTask),
        connector.clone(),
        inputs,
        &DispatchOptions { concurrency: 2 },
    )
    .await;

    assert_eq!(results.len(), 4);
    for (i, host) in [(0, "r1"), (2, "r3"), (3, "r4")] {
        match &results[i] {
            TaskResult::Success(record) => assert_eq!(record["hostname"], host),
            other => panic!("expected success for {}, got {:?}", host, other),
        }
    }
    match &results[1] {
        TaskResult::Failure { target, message } => {
            assert_eq!(target.host(), "r2");
            assert!(message.starts_with("Cannot connect to device"));
        }
        other => panic!("expected failure, got {:?}", other),
    }

    assert_eq!(connector.opened(), 3);
    assert_eq!(connector.closed(), 3);
}

#[tokio::test]
async fn test_dispatch_result_count_matches_inputs() {
    let mut connector = FakeConnector::new();
    let mut inputs = Vec::new();
    for i in 0..25 {
        let host = format!("10.0.0.{}", i);
        if i % 3 != 0 {
            connector = connector.with(&host, FakeDevice::up(&host));
        }
        inputs.push(input(&host, 22, TaskParameters::default()));
    }

    let results = dispatch(
        Arc::new(FactsTask),
        Arc::new(connector),
        inputs,
        &DispatchOptions::default(),
    )
    .await;

    assert_eq!(results.len(), 25);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.is_success(), i % 3 != 0, "slot {}", i);
        if let TaskResult::Success(record) = result {
            assert_eq!(record["host"], format!("10.0.0.{}", i));
        }
    }
}
