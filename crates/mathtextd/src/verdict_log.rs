//! Verdict log sink - batched, fire-and-forget persistence of request/verdict pairs.
//!
//! `VerdictLogger::record` never blocks: it pushes onto a bounded channel
//! and a background flusher writes batches to a `LogStore`. A failed batch
//! is retried with linear backoff, then re-queued in memory. Records are
//! only lost on process crash, on a full channel, or beyond the buffer cap.
//!
//! Schema (SQLite store):
//! - verdict_log: id, recorded_at, request fields, verdict type/data/confidence, full verdict JSON

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use mathtext_shared::{EvaluationRequest, Verdict};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::LoggingConfig;

#[derive(Error, Debug)]
pub enum LogStoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Store rejected batch: {0}")]
    Rejected(String),
}

/// One logged evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub request: EvaluationRequest,
    pub verdict: Verdict,
}

impl VerdictRecord {
    pub fn new(request: &EvaluationRequest, verdict: &Verdict) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            request: request.clone(),
            verdict: verdict.clone(),
        }
    }
}

// ============================================================================
// Store Trait
// ============================================================================

#[async_trait]
pub trait LogStore: Send + Sync {
    /// Writes the whole batch or nothing.
    async fn write_batch(&self, batch: &[VerdictRecord]) -> Result<(), LogStoreError>;

    fn name(&self) -> &str;
}

// ============================================================================
// SQLite Store (Production)
// ============================================================================

/// Default verdict database path
pub const VERDICT_DB_PATH: &str = "/var/lib/mathtext/verdicts.db";

pub struct SqliteLogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLogStore {
    /// Open at a specific path (for testing or daemon)
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, LogStoreError> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path_ref)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, LogStoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, LogStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS verdict_log (
                id TEXT PRIMARY KEY,
                recorded_at TEXT NOT NULL,
                student_message TEXT NOT NULL,
                expected_answer TEXT NOT NULL,
                verdict_type TEXT NOT NULL,
                verdict_data TEXT NOT NULL,
                confidence REAL NOT NULL,
                verdict_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_verdict_log_time ON verdict_log(recorded_at);
            CREATE INDEX IF NOT EXISTS idx_verdict_log_type ON verdict_log(verdict_type);
            "#,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>, LogStoreError> {
        conn.lock()
            .map_err(|_| LogStoreError::Rejected("connection lock poisoned".to_string()))
    }

    /// Number of stored rows
    pub fn count(&self) -> Result<usize, LogStoreError> {
        let conn = Self::lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM verdict_log", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<VerdictRecord>, LogStoreError> {
        let conn = Self::lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, recorded_at, student_message, expected_answer, verdict_json
             FROM verdict_log ORDER BY recorded_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, recorded_at, student_message, expected_answer, verdict_json) = row?;
            let (Ok(id), Ok(recorded_at)) = (
                Uuid::parse_str(&id),
                DateTime::parse_from_rfc3339(&recorded_at),
            ) else {
                warn!(id = %id, "Skipping malformed verdict_log row");
                continue;
            };
            records.push(VerdictRecord {
                id,
                recorded_at: recorded_at.with_timezone(&Utc),
                request: EvaluationRequest::new(student_message, expected_answer),
                verdict: serde_json::from_str(&verdict_json)?,
            });
        }
        Ok(records)
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn write_batch(&self, batch: &[VerdictRecord]) -> Result<(), LogStoreError> {
        let mut rows = Vec::with_capacity(batch.len());
        for record in batch {
            rows.push((
                record.id.to_string(),
                record.recorded_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                record.request.student_message.clone(),
                record.request.expected_answer.clone(),
                record.verdict.kind.to_string(),
                record.verdict.data.clone(),
                record.verdict.confidence,
                serde_json::to_string(&record.verdict)?,
            ));
        }

        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<(), LogStoreError> {
            let conn = Self::lock(&conn)?;
            let tx = conn.unchecked_transaction()?;
            {
                // Retried batches may already be partly stored
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO verdict_log
                     (id, recorded_at, student_message, expected_answer,
                      verdict_type, verdict_data, confidence, verdict_json)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;
                for row in &rows {
                    stmt.execute(params![row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await?
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

// ============================================================================
// Memory Store (Testing)
// ============================================================================

/// In-memory store with injectable failures.
#[derive(Default)]
pub struct MemoryLogStore {
    records: Mutex<Vec<VerdictRecord>>,
    failures_remaining: AtomicUsize,
    attempts: AtomicUsize,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` writes fail
    pub fn fail_next(&self, n: usize) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<VerdictRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn write_batch(&self, batch: &[VerdictRecord]) -> Result<(), LogStoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(LogStoreError::Rejected("injected failure".to_string()));
        }
        let mut records = self
            .records
            .lock()
            .map_err(|_| LogStoreError::Rejected("records lock poisoned".to_string()))?;
        records.extend_from_slice(batch);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Logger and Flusher
// ============================================================================

/// Flusher tuning.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub flush_threshold: usize,
    pub flush_interval: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub channel_capacity: usize,
    pub max_buffered_records: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self::from_config(&LoggingConfig::default())
    }
}

impl LogSettings {
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            flush_threshold: config.flush_threshold.max(1),
            flush_interval: Duration::from_millis(config.flush_interval_ms.max(1)),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            channel_capacity: config.channel_capacity.max(1),
            max_buffered_records: config.max_buffered_records.max(1),
        }
    }
}

/// Cheap, cloneable handle used on the response path.
#[derive(Clone)]
pub struct VerdictLogger {
    tx: mpsc::Sender<VerdictRecord>,
}

impl VerdictLogger {
    /// Queue a record; drops it (with a warning) rather than wait.
    pub fn record(&self, request: &EvaluationRequest, verdict: &Verdict) {
        match self.tx.try_send(VerdictRecord::new(request, verdict)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Verdict log channel full, dropping record"),
            Err(TrySendError::Closed(_)) => warn!("Verdict log flusher stopped, dropping record"),
        }
    }
}

/// Starts the background flusher. It exits after every logger clone is
/// dropped and a final flush has run.
pub fn spawn_verdict_logger(
    store: Arc<dyn LogStore>,
    settings: LogSettings,
) -> (VerdictLogger, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(settings.channel_capacity);
    let handle = tokio::spawn(run_flusher(rx, store, settings));
    (VerdictLogger { tx }, handle)
}

/// SQLite-backed logger from config.
pub fn start_sqlite_logger(
    config: &LoggingConfig,
) -> Result<(VerdictLogger, JoinHandle<()>), LogStoreError> {
    let store = SqliteLogStore::open_at(&config.db_path)?;
    info!(path = %config.db_path, "Verdict log opened");
    Ok(spawn_verdict_logger(Arc::new(store), LogSettings::from_config(config)))
}

async fn run_flusher(
    mut rx: mpsc::Receiver<VerdictRecord>,
    store: Arc<dyn LogStore>,
    settings: LogSettings,
) {
    let mut buffer: VecDeque<VerdictRecord> = VecDeque::new();
    let mut ticker = tokio::time::interval(settings.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;
    // After a failed flush only the ticker retries, not the threshold
    let mut backing_off = false;

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(record) => {
                    buffer.push_back(record);
                    if !backing_off && buffer.len() >= settings.flush_threshold {
                        backing_off = !flush(store.as_ref(), &mut buffer, &settings).await;
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                if !buffer.is_empty() {
                    backing_off = !flush(store.as_ref(), &mut buffer, &settings).await;
                }
            }
        }
    }

    if !buffer.is_empty() {
        flush(store.as_ref(), &mut buffer, &settings).await;
    }
    if !buffer.is_empty() {
        error!(lost = buffer.len(), store = store.name(), "Verdict log shut down with unwritten records");
    }
}

/// Writes the whole buffer as one batch. On exhausted retries the batch goes
/// back to the front of the buffer. Returns true when written.
async fn flush(store: &dyn LogStore, buffer: &mut VecDeque<VerdictRecord>, settings: &LogSettings) -> bool {
    let batch: Vec<VerdictRecord> = buffer.drain(..).collect();

    for attempt in 0..=settings.max_retries {
        match store.write_batch(&batch).await {
            Ok(()) => {
                debug!(count = batch.len(), attempt, store = store.name(), "Flushed verdict batch");
                return true;
            }
            Err(e) => {
                warn!(attempt, max_retries = settings.max_retries, "Verdict batch write failed: {}", e);
                if attempt < settings.max_retries {
                    tokio::time::sleep(settings.retry_backoff * (attempt + 1)).await;
                }
            }
        }
    }

    error!(count = batch.len(), "Retries exhausted, re-queuing verdict batch");
    for record in batch.into_iter().rev() {
        buffer.push_front(record);
    }
    let mut dropped = 0;
    while buffer.len() > settings.max_buffered_records {
        buffer.pop_front();
        dropped += 1;
    }
    if dropped > 0 {
        warn!(dropped, "Verdict buffer over capacity, oldest records dropped");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathtext_shared::VerdictKind;

    fn record(n: usize) -> VerdictRecord {
        VerdictRecord::new(
            &EvaluationRequest::new(n.to_string(), "1"),
            &Verdict::single_event(VerdictKind::WrongAnswer, n.to_string()),
        )
    }

    fn fast_settings(max_buffered_records: usize) -> LogSettings {
        LogSettings {
            flush_threshold: 100,
            flush_interval: Duration::from_secs(60),
            max_retries: 3,
            retry_backoff: Duration::from_millis(1),
            channel_capacity: 16,
            max_buffered_records,
        }
    }

    #[tokio::test]
    async fn test_failed_flush_requeues_in_order() {
        let store = MemoryLogStore::new();
        store.fail_next(4);
        let mut buffer: VecDeque<VerdictRecord> = (0..3).map(record).collect();
        let ids: Vec<Uuid> = buffer.iter().map(|r| r.id).collect();

        assert!(!flush(&store, &mut buffer, &fast_settings(100)).await);
        assert_eq!(store.attempts(), 4);
        assert_eq!(buffer.iter().map(|r| r.id).collect::<Vec<_>>(), ids);

        assert!(flush(&store, &mut buffer, &fast_settings(100)).await);
        assert!(buffer.is_empty());
        assert_eq!(store.records().len(), 3);
    }

    #[tokio::test]
    async fn test_requeue_respects_buffer_cap() {
        let store = MemoryLogStore::new();
        store.fail_next(10);
        let mut buffer: VecDeque<VerdictRecord> = (0..5).map(record).collect();
        let newest = buffer.back().map(|r| r.id);

        assert!(!flush(&store, &mut buffer, &fast_settings(2)).await);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.back().map(|r| r.id), newest);
    }
}
