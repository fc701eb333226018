//! Verdict log sink tests: flush triggers, retries, SQLite storage.

use mathtext_shared::{EvaluationRequest, Verdict, VerdictKind};
use mathtextd::verdict_log::{
    spawn_verdict_logger, LogSettings, LogStore, MemoryLogStore, SqliteLogStore, VerdictRecord,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn settings(flush_threshold: usize, flush_interval: Duration) -> LogSettings {
    LogSettings {
        flush_threshold,
        flush_interval,
        max_retries: 3,
        retry_backoff: Duration::from_millis(1),
        channel_capacity: 64,
        max_buffered_records: 1_000,
    }
}

fn request(n: usize) -> EvaluationRequest {
    EvaluationRequest::new(n.to_string(), "5")
}

fn verdict(n: usize) -> Verdict {
    Verdict::single_event(VerdictKind::WrongAnswer, n.to_string())
}

/// Polls until the store holds `expected` records or a second passes.
async fn wait_for_records(store: &MemoryLogStore, expected: usize) -> usize {
    for _ in 0..100 {
        let count = store.records().len();
        if count >= expected {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    store.records().len()
}

// ============================================================================
// Flush triggers
// ============================================================================

#[tokio::test]
async fn test_flush_at_threshold() {
    let store = Arc::new(MemoryLogStore::new());
    let (logger, _flusher) = spawn_verdict_logger(
        store.clone() as Arc<dyn LogStore>,
        settings(3, Duration::from_secs(60)),
    );

    logger.record(&request(1), &verdict(1));
    logger.record(&request(2), &verdict(2));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.records().is_empty());

    logger.record(&request(3), &verdict(3));
    assert_eq!(wait_for_records(&store, 3).await, 3);
    assert_eq!(store.attempts(), 1);
}

#[tokio::test]
async fn test_flush_on_interval() {
    let store = Arc::new(MemoryLogStore::new());
    let (logger, _flusher) = spawn_verdict_logger(
        store.clone() as Arc<dyn LogStore>,
        settings(100, Duration::from_millis(50)),
    );

    logger.record(&request(1), &verdict(1));
    assert_eq!(wait_for_records(&store, 1).await, 1);
}

#[tokio::test]
async fn test_flush_on_shutdown() {
    let store = Arc::new(MemoryLogStore::new());
    let (logger, flusher) = spawn_verdict_logger(
        store.clone() as Arc<dyn LogStore>,
        settings(100, Duration::from_secs(60)),
    );

    let clone = logger.clone();
    logger.record(&request(1), &verdict(1));
    clone.record(&request(2), &verdict(2));
    drop(logger);
    drop(clone);
    flusher.await.unwrap();

    let records = store.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].request.student_message, "1");
    assert_eq!(records[1].request.student_message, "2");
}

// ============================================================================
// Retries
// ============================================================================

#[tokio::test]
async fn test_retry_then_success() {
    let store = Arc::new(MemoryLogStore::new());
    store.fail_next(2);
    let (logger, flusher) = spawn_verdict_logger(
        store.clone() as Arc<dyn LogStore>,
        settings(1, Duration::from_secs(60)),
    );

    logger.record(&request(1), &verdict(1));
    drop(logger);
    flusher.await.unwrap();

    assert_eq!(store.attempts(), 3);
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn test_exhausted_batch_is_kept_for_next_flush() {
    let store = Arc::new(MemoryLogStore::new());
    // 1 attempt + 3 retries all fail; the shutdown flush succeeds
    store.fail_next(4);
    let (logger, flusher) = spawn_verdict_logger(
        store.clone() as Arc<dyn LogStore>,
        settings(1, Duration::from_secs(60)),
    );

    logger.record(&request(1), &verdict(1));
    drop(logger);
    flusher.await.unwrap();

    assert_eq!(store.attempts(), 5);
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn test_failed_flush_waits_for_tick() {
    let store = Arc::new(MemoryLogStore::new());
    store.fail_next(4);
    let (logger, flusher) = spawn_verdict_logger(
        store.clone() as Arc<dyn LogStore>,
        settings(1, Duration::from_secs(60)),
    );

    logger.record(&request(1), &verdict(1));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.attempts(), 4);

    // Still over the threshold, but no new retry cycle before the tick
    logger.record(&request(2), &verdict(2));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.attempts(), 4);
    assert!(store.records().is_empty());

    drop(logger);
    flusher.await.unwrap();
    assert_eq!(store.attempts(), 5);
    assert_eq!(store.records().len(), 2);
}

// ============================================================================
// SQLite store
// ============================================================================

#[tokio::test]
async fn test_sqlite_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = SqliteLogStore::open_at(dir.path().join("nested").join("verdicts.db")).unwrap();

    let first = VerdictRecord::new(&request(1), &Verdict::single_event(VerdictKind::CorrectAnswer, "5"));
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = VerdictRecord::new(&request(2), &Verdict::out_of_scope("2"));
    store.write_batch(&[first.clone(), second.clone()]).await.unwrap();
    assert_eq!(store.count().unwrap(), 2);

    let recent = store.recent(1).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, second.id);
    assert_eq!(recent[0].verdict, second.verdict);
    assert_eq!(recent[0].request, second.request);
}

#[tokio::test]
async fn test_sqlite_rewrite_is_idempotent() {
    let store = SqliteLogStore::open_in_memory().unwrap();
    let batch: Vec<VerdictRecord> = (0..3).map(|n| VerdictRecord::new(&request(n), &verdict(n))).collect();

    store.write_batch(&batch).await.unwrap();
    store.write_batch(&batch).await.unwrap();
    assert_eq!(store.count().unwrap(), 3);
}

#[tokio::test]
async fn test_sqlite_logger_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("verdicts.db");
    let store = Arc::new(SqliteLogStore::open_at(&path).unwrap());
    let (logger, flusher) = spawn_verdict_logger(
        store.clone() as Arc<dyn LogStore>,
        settings(10, Duration::from_secs(60)),
    );

    for n in 0..4 {
        logger.record(&request(n), &verdict(n));
    }
    drop(logger);
    flusher.await.unwrap();

    assert_eq!(store.count().unwrap(), 4);
}
