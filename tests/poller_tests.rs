mod common;

use std::sync::Arc;
use std::time::Duration;

use polymonitor::services::notifier::AlertNotifier;
use polymonitor::services::{CycleStats, Monitor};

use common::{
    evaluator, make_trade, temp_ledger, test_config, RecordingNotifier, StaticSource, StubOracle,
};

#[tokio::test]
async fn test_duplicate_hash_in_batch_is_ingested_once() {
    let (_dir, ledger) = temp_ledger().await;
    let batch = vec![
        make_trade("0xdup", "0xA", "M", 10.0),
        make_trade("0xdup", "0xA", "M", 10.0),
        make_trade("0xother", "0xB", "M", 20.0),
    ];
    let monitor = Monitor::new(
        Box::new(StaticSource(batch)),
        evaluator(ledger.clone(), Arc::new(StubOracle::unknown()), None, 5000.0),
        Duration::from_secs(1),
    );

    let stats = monitor.run_once().await.expect("Cycle should succeed");

    assert_eq!(
        stats,
        CycleStats {
            fetched: 3,
            processed: 2,
            skipped: 1,
            alerts: 0,
        }
    );
    assert_eq!(ledger.count_entries().await.unwrap(), 2);
}

#[tokio::test]
async fn test_trades_without_hash_are_dropped() {
    let (_dir, ledger) = temp_ledger().await;
    let mut missing = make_trade("", "0xA", "M", 10.0);
    missing.tx_hash = None;
    let empty = make_trade("", "0xA", "M", 10.0);
    let monitor = Monitor::new(
        Box::new(StaticSource(vec![missing, empty, make_trade("0xok", "0xA", "M", 1.0)])),
        evaluator(ledger.clone(), Arc::new(StubOracle::unknown()), None, 5000.0),
        Duration::from_secs(1),
    );

    let stats = monitor.run_once().await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(ledger.count_entries().await.unwrap(), 1);
}

#[tokio::test]
async fn test_dedup_does_not_span_cycles() {
    let (_dir, ledger) = temp_ledger().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = Monitor::new(
        Box::new(StaticSource(vec![make_trade("0xsame", "0xREPEAT", "M", 1.0)])),
        evaluator(
            ledger.clone(),
            Arc::new(StubOracle::unknown()),
            Some(notifier.clone() as Arc<dyn AlertNotifier>),
            5000.0,
        ),
        Duration::from_secs(1),
    );

    for _ in 0..3 {
        monitor.run_once().await.unwrap();
    }

    // The same trade seen on three polls is recorded three times and trips
    // the frequency signal on the third.
    assert_eq!(ledger.count_entries().await.unwrap(), 3);
    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reason.as_str(), "high_frequency");
}

#[tokio::test]
async fn test_ledger_failure_fails_the_cycle() {
    let (_dir, ledger) = temp_ledger().await;
    let monitor = Monitor::new(
        Box::new(StaticSource(vec![make_trade("0xboom", "0xA", "M", 1.0)])),
        evaluator(ledger.clone(), Arc::new(StubOracle::unknown()), None, 5000.0),
        Duration::from_secs(1),
    );

    ledger.pool().close().await;

    assert!(monitor.run_once().await.is_err());
}

#[tokio::test]
async fn test_empty_batch_is_a_quiet_cycle() {
    let (_dir, ledger) = temp_ledger().await;
    let monitor = Monitor::new(
        Box::new(StaticSource(vec![])),
        evaluator(ledger.clone(), Arc::new(StubOracle::unknown()), None, 5000.0),
        Duration::from_secs(1),
    );

    assert_eq!(monitor.run_once().await.unwrap(), CycleStats::default());
    assert_eq!(ledger.count_entries().await.unwrap(), 0);
}

#[tokio::test]
async fn test_build_monitor_with_no_source_configured() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let monitor = polymonitor::build_monitor(&config)
        .await
        .expect("Wiring should succeed without optional collaborators");

    assert_eq!(monitor.run_once().await.unwrap(), CycleStats::default());
    assert_eq!(monitor.evaluator().ledger().count_entries().await.unwrap(), 0);
    assert!(dir.path().join("monitor.db").exists());
}

#[tokio::test]
async fn test_loop_survives_failing_cycles() {
    let (_dir, ledger) = temp_ledger().await;
    let monitor = Monitor::new(
        Box::new(StaticSource(vec![make_trade("0xloop", "0xA", "M", 1.0)])),
        evaluator(ledger.clone(), Arc::new(StubOracle::unknown()), None, 5000.0),
        Duration::from_millis(20),
    );
    assert!(monitor.run_once().await.is_ok());

    ledger.pool().close().await;
    assert!(monitor.run_once().await.is_err());

    // Every cycle now fails; the loop must keep polling instead of returning.
    let outcome = tokio::time::timeout(Duration::from_millis(300), monitor.run()).await;
    assert!(outcome.is_err(), "run() returned: {outcome:?}");
}
