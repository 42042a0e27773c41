//! Live auditor
//!
//! Bounded-concurrency driver over HTTP artifacts. A fixed pool of three
//! logical workers drains a shared FIFO queue; each worker loops "pop,
//! check deadline, check breaker, fetch, audit" until the queue is empty.
//! tokio's runtime is multi-threaded, so the shared failure counter is an
//! atomic and the queue sits behind a mutex (the cooperative-runtime
//! assumption of a single-threaded port does not hold here).
//!
//! Workers complete out of order; total ordering is restored exactly once,
//! at report-assembly time, by sorting on blockId, so live output is
//! byte-comparable with local output for the same data.

use chrono::Utc;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::client::ArtifactClient;
use crate::contracts::{
    contract_hash, AuditMode, AuditReport, BlockReport, BlockSpec, Evidence, Reason, ReasonCode,
    TraceEntry,
};
use crate::engine::AuditEngine;

/// Logical workers draining the queue; at most this many outstanding
/// requests at any instant
pub const WORKER_CONCURRENCY: usize = 3;

/// Recorded failed attempts after which no new fetches start
pub const CIRCUIT_BREAKER_THRESHOLD: u32 = 5;

/// HTTP audit driver
pub struct LiveAuditor {
    engine: AuditEngine,
    client: ArtifactClient,
    base_url: String,
}

impl LiveAuditor {
    pub fn new(engine: AuditEngine, client: ArtifactClient, base_url: impl Into<String>) -> Self {
        Self {
            engine,
            client,
            base_url: base_url.into(),
        }
    }

    /// Audit every discovered block against the base URL
    pub async fn run(&self, mut specs: Vec<BlockSpec>, trace: Vec<TraceEntry>) -> AuditReport {
        let started_at = Utc::now();
        let run_start = Instant::now();
        let budget = Duration::from_millis(self.engine.limits().max_audit_time_ms);

        specs.sort_by(|a, b| a.block_id.cmp(&b.block_id));
        specs.truncate(self.engine.limits().max_blocks_live);
        let hash = contract_hash(&specs);

        if reqwest::Url::parse(&self.base_url).is_err() {
            let blocks = specs
                .iter()
                .map(|spec| self.misconfigured(spec))
                .collect();
            return AuditReport::assemble(
                AuditMode::Live,
                &self.base_url,
                hash,
                started_at,
                run_start.elapsed().as_millis() as u64,
                blocks,
                trace,
            );
        }

        let queue: Arc<Mutex<VecDeque<BlockSpec>>> = Arc::new(Mutex::new(specs.into()));
        let failures = Arc::new(AtomicU32::new(0));

        let workers = (0..WORKER_CONCURRENCY)
            .map(|_| self.worker(Arc::clone(&queue), Arc::clone(&failures), run_start, budget));
        let results = futures::future::join_all(workers).await;
        let blocks: Vec<BlockReport> = results.into_iter().flatten().collect();

        AuditReport::assemble(
            AuditMode::Live,
            &self.base_url,
            hash,
            started_at,
            run_start.elapsed().as_millis() as u64,
            blocks,
            trace,
        )
    }

    /// One logical worker: drain the queue until it is empty
    async fn worker(
        &self,
        queue: Arc<Mutex<VecDeque<BlockSpec>>>,
        failures: Arc<AtomicU32>,
        run_start: Instant,
        budget: Duration,
    ) -> Vec<BlockReport> {
        let mut results = Vec::new();

        loop {
            let spec = {
                let mut queue = queue.lock().expect("work queue mutex poisoned");
                queue.pop_front()
            };
            let Some(spec) = spec else {
                break;
            };

            let url = join_url(&self.base_url, &spec.mirror_path);

            // Deadline first: when both the budget and the breaker would
            // suppress this item, the time budget is the reported cause.
            if run_start.elapsed() > budget {
                results.push(over_budget(&spec, &url, run_start.elapsed(), budget));
                continue;
            }

            let recorded = failures.load(Ordering::SeqCst);
            if recorded >= CIRCUIT_BREAKER_THRESHOLD {
                results.push(circuit_open(&spec, &url, recorded));
                continue;
            }

            match self.client.fetch_with_retry(&url, &failures).await {
                Ok(doc) => {
                    results.push(self.engine.audit_document(&spec, &url, &doc, Utc::now()));
                }
                Err(error) => {
                    tracing::warn!(
                        block_id = %spec.block_id,
                        url = url,
                        error = %error,
                        "live block failed"
                    );
                    results.push(BlockReport::failed(
                        &spec.block_id,
                        &url,
                        spec.optional,
                        error.into_reason(),
                    ));
                }
            }
        }

        results
    }

    /// Block error when the base URL never parsed; nothing is fetched
    fn misconfigured(&self, spec: &BlockSpec) -> BlockReport {
        let reason = Reason::evidenced(
            ReasonCode::BaseUrlMisconfig,
            format!("base URL '{}' cannot be parsed", self.base_url),
            vec![Evidence::new(
                "value",
                &self.base_url,
                json!(self.base_url),
                "live base URL rejected by URL parsing",
            )],
        );
        BlockReport::failed(&spec.block_id, &self.base_url, spec.optional, reason)
    }
}

/// NOT_AUDITED result for a block suppressed by the open breaker
fn circuit_open(spec: &BlockSpec, url: &str, recorded: u32) -> BlockReport {
    let reason = Reason::evidenced(
        ReasonCode::CircuitOpen,
        "circuit breaker open, fetch suppressed",
        vec![Evidence::new(
            "breaker",
            url,
            json!({
                "recordedFailures": recorded,
                "threshold": CIRCUIT_BREAKER_THRESHOLD,
            }),
            "failure count crossed the breaker threshold before this item",
        )],
    );
    BlockReport::not_audited(&spec.block_id, url, spec.optional, reason)
}

/// NOT_AUDITED result for a block suppressed by the time budget
fn over_budget(spec: &BlockSpec, url: &str, elapsed: Duration, budget: Duration) -> BlockReport {
    let reason = Reason::evidenced(
        ReasonCode::LimitExceeded,
        "audit time budget exhausted before this block was fetched",
        vec![Evidence::new(
            "budget",
            url,
            json!({
                "elapsedMs": elapsed.as_millis() as u64,
                "budgetMs": budget.as_millis() as u64,
            }),
            "wall-clock deadline reached at a work-item boundary",
        )],
    );
    BlockReport::not_audited(&spec.block_id, url, spec.optional, reason)
}

/// Join the base URL and a mirror path with exactly one slash
fn join_url(base: &str, mirror_path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        mirror_path.trim_start_matches('/')
    )
}
