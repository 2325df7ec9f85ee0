//! Background inference worker.
//!
//! The ingestion path never runs inference inline. After a raw record is
//! written it hands an [`InferenceJob`] to an [`InferenceQueue`] and
//! returns; a single tokio task drains the queue and runs the engine.
//! Inference failures are logged here and go no further, so they can never
//! fail or delay a record write.
//!
//! ```text
//! ingest ──write──▶ raw_records
//!    │
//!    └─enqueue──▶ [ mpsc queue ] ──▶ worker task ──▶ VersionManager
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use schema_harness_core::VersionManager;

/// One request to run an inference pass.
#[derive(Debug, Clone, Copy)]
pub struct InferenceJob {
    pub sample_size: usize,
}

/// Why a job was not queued. Informational only; callers on the ingestion
/// path are expected to ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueStatus {
    Queued,
    /// The queue is full. The jobs already waiting will sample the new
    /// record anyway.
    Dropped,
    /// The worker has shut down.
    Closed,
}

/// Cheap-to-clone handle for submitting inference jobs.
#[derive(Clone)]
pub struct InferenceQueue {
    tx: mpsc::Sender<InferenceJob>,
    default_sample_size: usize,
}

impl InferenceQueue {
    /// Submit a job without waiting.
    pub fn enqueue(&self, job: InferenceJob) -> EnqueueStatus {
        match self.tx.try_send(job) {
            Ok(()) => EnqueueStatus::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(sample_size = job.sample_size, "inference queue full; job dropped");
                EnqueueStatus::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("inference worker is gone; job dropped");
                EnqueueStatus::Closed
            }
        }
    }

    /// Submit a job with the configured default sample size.
    pub fn enqueue_default(&self) -> EnqueueStatus {
        self.enqueue(InferenceJob {
            sample_size: self.default_sample_size,
        })
    }
}

/// Counters reported by the worker when its queue closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub jobs_run: u64,
    pub versions_created: u64,
    pub failures: u64,
}

/// Spawn the worker task. It exits once every [`InferenceQueue`] clone has
/// been dropped and the queue is drained.
pub fn spawn_inference_worker(
    manager: Arc<VersionManager>,
    capacity: usize,
) -> (InferenceQueue, JoinHandle<WorkerReport>) {
    let (tx, mut rx) = mpsc::channel::<InferenceJob>(capacity.max(1));
    let queue = InferenceQueue {
        tx,
        default_sample_size: manager.config().default_sample_size,
    };

    let handle = tokio::spawn(async move {
        let mut report = WorkerReport::default();
        while let Some(job) = rx.recv().await {
            report.jobs_run += 1;
            match manager.infer_and_maybe_create_version(job.sample_size).await {
                Ok(Some(snapshot)) => {
                    report.versions_created += 1;
                    info!(version = snapshot.version, "background inference recorded schema drift");
                }
                Ok(None) => {}
                Err(e) => {
                    report.failures += 1;
                    warn!(error = %e, sample_size = job.sample_size, "background inference failed");
                }
            }
        }
        debug!(?report, "inference worker stopped");
        report
    });

    (queue, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use schema_harness_core::store::memory::InMemoryStore;
    use schema_harness_core::{EngineConfig, RawRecord};
    use serde_json::json;

    fn store_with(payloads: &[serde_json::Value]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for (i, p) in payloads.iter().enumerate() {
            store
                .push_record(RawRecord {
                    id: i.to_string(),
                    source: "test".into(),
                    payload: p.clone(),
                    ingested_at: Utc::now(),
                })
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_worker_runs_jobs_and_reports() {
        let store = store_with(&[json!({"a": 1})]);
        let manager = Arc::new(VersionManager::new(
            store.clone(),
            store.clone(),
            EngineConfig::default(),
        ));
        let (queue, handle) = spawn_inference_worker(manager.clone(), 8);

        assert_eq!(queue.enqueue_default(), EnqueueStatus::Queued);
        assert_eq!(queue.enqueue_default(), EnqueueStatus::Queued);
        drop(queue);

        let report = handle.await.unwrap();
        assert_eq!(report.jobs_run, 2);
        assert_eq!(report.versions_created, 1);
        assert_eq!(report.failures, 0);
        assert_eq!(manager.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (tx, _rx) = mpsc::channel(1);
        let queue = InferenceQueue {
            tx,
            default_sample_size: 30,
        };
        assert_eq!(queue.enqueue_default(), EnqueueStatus::Queued);
        assert_eq!(queue.enqueue_default(), EnqueueStatus::Dropped);
    }

    #[tokio::test]
    async fn test_closed_queue_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let queue = InferenceQueue {
            tx,
            default_sample_size: 30,
        };
        assert_eq!(queue.enqueue_default(), EnqueueStatus::Closed);
    }
}
