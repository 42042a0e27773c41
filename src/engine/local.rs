//! Local auditor
//!
//! Sequential driver over on-disk artifacts. Blocks are processed in
//! ascending blockId order; the wall-clock budget is checked before every
//! block, including the first, and once the budget is exhausted no further
//! reads are performed.

use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::contracts::{
    contract_hash, AuditMode, AuditReport, BlockReport, BlockSpec, Evidence, Reason, ReasonCode,
    TraceEntry,
};
use crate::engine::AuditEngine;

/// Filesystem audit driver
pub struct LocalAuditor {
    engine: AuditEngine,
    base: PathBuf,
}

impl LocalAuditor {
    pub fn new(engine: AuditEngine, base: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            base: base.into(),
        }
    }

    /// Audit every discovered block under the base directory
    pub fn run(&self, mut specs: Vec<BlockSpec>, trace: Vec<TraceEntry>) -> AuditReport {
        let started_at = Utc::now();
        let run_start = Instant::now();
        let budget = Duration::from_millis(self.engine.limits().max_audit_time_ms);

        specs.sort_by(|a, b| a.block_id.cmp(&b.block_id));
        specs.truncate(self.engine.limits().max_blocks);
        let hash = contract_hash(&specs);

        let mut blocks = Vec::with_capacity(specs.len());
        for spec in &specs {
            let path = self.base.join(&spec.mirror_path);
            let location = path.display().to_string();

            if run_start.elapsed() > budget {
                tracing::warn!(
                    block_id = %spec.block_id,
                    elapsed_ms = run_start.elapsed().as_millis() as u64,
                    "audit budget exhausted, skipping remaining blocks"
                );
                blocks.push(over_budget(spec, &location, run_start.elapsed(), budget));
                continue;
            }

            blocks.push(self.audit_file(spec, &path, &location));
        }

        AuditReport::assemble(
            AuditMode::Local,
            self.base.display().to_string(),
            hash,
            started_at,
            run_start.elapsed().as_millis() as u64,
            blocks,
            trace,
        )
    }

    /// Read, parse and audit one artifact file
    fn audit_file(&self, spec: &BlockSpec, path: &Path, location: &str) -> BlockReport {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                let reason = Reason::evidenced(
                    ReasonCode::FileMissing,
                    format!("artifact could not be read: {}", error),
                    vec![Evidence::new(
                        "io",
                        location,
                        json!({ "kind": format!("{:?}", error.kind()) }),
                        "filesystem read failed",
                    )],
                );
                return BlockReport::failed(&spec.block_id, location, spec.optional, reason);
            }
        };

        let doc: serde_json::Value = match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(error) => {
                let reason = Reason::evidenced(
                    ReasonCode::JsonParseError,
                    "artifact is not valid JSON".to_string(),
                    vec![Evidence::new(
                        "exception",
                        location,
                        json!({
                            "error": error.to_string(),
                            "line": error.line(),
                            "column": error.column(),
                        }),
                        "JSON parsing failed",
                    )],
                );
                return BlockReport::failed(&spec.block_id, location, spec.optional, reason);
            }
        };

        self.engine.audit_document(spec, location, &doc, Utc::now())
    }
}

/// NOT_AUDITED result for a block skipped by the time budget
fn over_budget(
    spec: &BlockSpec,
    location: &str,
    elapsed: Duration,
    budget: Duration,
) -> BlockReport {
    let reason = Reason::evidenced(
        ReasonCode::LimitExceeded,
        "audit time budget exhausted before this block was read",
        vec![Evidence::new(
            "budget",
            location,
            json!({
                "elapsedMs": elapsed.as_millis() as u64,
                "budgetMs": budget.as_millis() as u64,
            }),
            "wall-clock deadline reached at a work-item boundary",
        )],
    );
    BlockReport::not_audited(&spec.block_id, location, spec.optional, reason)
}
