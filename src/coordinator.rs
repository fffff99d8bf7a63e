//! Batch coordinator: fan probes out over a bounded pool and merge results back
//!
//! One task is spawned per record so results can be collected positionally.
//! Unselected records come back untouched without any I/O. A semaphore sized
//! to the worker count bounds in-flight probes.

use crate::client::Fetch;
use crate::error::ProbeError;
use crate::probe::{probe, ProbeSpec};
use crate::progress::spawn_reporter;
use crate::schema::Endpoint;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

/// Pool sizing and shutdown timing
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum probes in flight
    pub workers: usize,
    /// How long to wait for the batch before shutting the pool down (`None` waits for all)
    pub max_wait: Option<Duration>,
    /// Extra time outstanding probes get after `max_wait` before they are aborted
    pub grace_period: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            max_wait: None,
            grace_period: Duration::from_secs(60),
        }
    }
}

/// A probe that produced no record
#[derive(Debug, Serialize)]
pub struct ProbeFailure {
    pub id: u32,
    pub address: String,
    pub kind: &'static str,
    pub error: String,
}

/// Result of one task, success or failure
#[derive(Debug)]
pub enum TaskOutcome {
    Success(Endpoint),
    Failure(ProbeFailure),
}

/// What a batch produced
#[derive(Debug)]
pub struct BatchReport {
    /// Merged records in input order, failed ones removed
    pub records: Vec<Endpoint>,
    /// Number of selected records
    pub total: usize,
    /// Completed, failed or cancelled probes the progress reporter counted
    pub processed: usize,
    pub failures: Vec<ProbeFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.total.saturating_sub(self.failures.len())
    }
}

/// Split outcomes into surviving records and failures.
///
/// Failed records are dropped from the output on purpose: a record is never
/// merged back with stale or guessed values, so the caller sees fewer records
/// than it passed in.
pub fn merge(outcomes: Vec<TaskOutcome>) -> (Vec<Endpoint>, Vec<ProbeFailure>) {
    let mut records = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            TaskOutcome::Success(record) => records.push(record),
            TaskOutcome::Failure(failure) => failures.push(failure),
        }
    }

    (records, failures)
}

/// Probe every record matching `selector` and return the merged record set.
///
/// Never fails: task errors, panics and cancellations become entries in
/// [`BatchReport::failures`].
pub async fn run_batch<F, P, W>(
    records: &[Endpoint],
    selector: P,
    spec: &ProbeSpec,
    fetcher: Arc<F>,
    config: &BatchConfig,
    progress_out: W,
) -> BatchReport
where
    F: Fetch + ?Sized + 'static,
    P: Fn(&Endpoint) -> bool,
    W: Write + Send + 'static,
{
    let selected: Vec<bool> = records.iter().map(&selector).collect();
    let total = selected.iter().filter(|s| **s).count();
    let workers = config.workers.max(1);

    tracing::info!(
        kind = %spec.kind,
        records = records.len(),
        selected = total,
        workers,
        "Starting probe batch"
    );

    let pool = Arc::new(Semaphore::new(workers));
    let shared_spec = Arc::new(spec.clone());
    let (progress, reporter) = spawn_reporter(total, progress_out);

    let handles: Vec<JoinHandle<Result<Endpoint, ProbeError>>> = records
        .iter()
        .zip(&selected)
        .map(|(endpoint, &is_selected)| {
            let endpoint = endpoint.clone();
            if !is_selected {
                return tokio::spawn(async move { Ok::<_, ProbeError>(endpoint) });
            }

            let tick = progress.tick();
            let pool = Arc::clone(&pool);
            let spec = Arc::clone(&shared_spec);
            let fetcher = Arc::clone(&fetcher);
            tokio::spawn(async move {
                let _tick = tick;
                let _permit = pool
                    .acquire_owned()
                    .await
                    .map_err(|_| ProbeError::Cancelled)?;
                probe(&endpoint, &spec, fetcher.as_ref()).await
            })
        })
        .collect();
    drop(progress);

    let mut deadline = config.max_wait.map(|wait| Instant::now() + wait);
    let mut shutting_down = false;
    let mut outcomes = Vec::with_capacity(records.len());

    for (endpoint, mut handle) in records.iter().zip(handles) {
        let joined = loop {
            if let Some(joined) = await_task(&mut handle, deadline).await {
                break joined;
            }
            if !shutting_down {
                // running and queued probes both keep going until the grace deadline
                tracing::warn!(
                    grace_secs = config.grace_period.as_secs_f64(),
                    "Maximum wait elapsed, shutting down worker pool"
                );
                shutting_down = true;
                deadline = Some(Instant::now() + config.grace_period);
            } else {
                handle.abort();
                break (&mut handle).await;
            }
        };

        outcomes.push(outcome_of(endpoint, spec, joined));
    }

    let processed = reporter.await.unwrap_or(total);
    let (records, failures) = merge(outcomes);

    tracing::info!(
        kind = %spec.kind,
        total,
        failed = failures.len(),
        returned = records.len(),
        "Probe batch finished"
    );

    BatchReport {
        records,
        total,
        processed,
        failures,
    }
}

/// `None` when the deadline passed before the task finished
async fn await_task<T>(
    handle: &mut JoinHandle<T>,
    deadline: Option<Instant>,
) -> Option<Result<T, JoinError>> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, handle).await.ok(),
        None => Some(handle.await),
    }
}

fn outcome_of(
    endpoint: &Endpoint,
    spec: &ProbeSpec,
    joined: Result<Result<Endpoint, ProbeError>, JoinError>,
) -> TaskOutcome {
    let error = match joined {
        Ok(Ok(record)) => return TaskOutcome::Success(record),
        Ok(Err(e)) => e,
        Err(e) if e.is_cancelled() => ProbeError::Cancelled,
        Err(e) => ProbeError::Panicked(e.to_string()),
    };

    let address = spec.address_for(endpoint);
    tracing::error!(
        id = endpoint.id,
        address = %address,
        error = %error,
        "Probe failed, dropping endpoint from batch"
    );

    TaskOutcome::Failure(ProbeFailure {
        id: endpoint.id,
        address,
        kind: error.kind(),
        error: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(id: u32) -> ProbeFailure {
        ProbeFailure {
            id,
            address: format!("http://{id}.example/"),
            kind: "FETCH_FAILED",
            error: "boom".to_string(),
        }
    }

    #[test]
    fn test_merge_drops_failures_in_order() {
        let outcomes = vec![
            TaskOutcome::Success(Endpoint::new(1, 1, "a")),
            TaskOutcome::Failure(failure(2)),
            TaskOutcome::Success(Endpoint::new(3, 1, "c")),
        ];
        let (records, failures) = merge(outcomes);
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, 2);
    }

    #[test]
    fn test_default_config() {
        let config = BatchConfig::default();
        assert!(config.workers >= 1);
        assert_eq!(config.grace_period, Duration::from_secs(60));
        assert!(config.max_wait.is_none());
    }

    #[test]
    fn test_succeeded() {
        let report = BatchReport {
            records: vec![],
            total: 3,
            processed: 3,
            failures: vec![failure(1)],
        };
        assert_eq!(report.succeeded(), 2);
    }
}
