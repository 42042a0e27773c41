//! Report structures produced by an audit run
//!
//! Ownership is strictly tree-shaped: an AuditReport owns its BlockReports,
//! a BlockReport owns its FieldReports, a FieldReport owns its Reasons and
//! a Reason owns its Evidence. Everything is created fresh per run; a run
//! is a pure function of the artifact contents at read time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::reason::{Evidence, Reason, ReasonCode, Severity};

/// Maximum characters kept in a field value preview
const PREVIEW_MAX_CHARS: usize = 100;

/// Render a short, report-safe preview of a JSON value
pub fn value_preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= PREVIEW_MAX_CHARS {
        return rendered;
    }
    let truncated: String = rendered.chars().take(PREVIEW_MAX_CHARS).collect();
    format!("{}...", truncated)
}

/// One audited location inside an artifact's JSON tree
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    /// Canonical slash-joined pointer (e.g. `/data/items/0/price`)
    pub path: String,
    /// Final path segment
    pub label: String,
    /// Whether a value exists at the path
    pub present: bool,
    /// Whether no reason at ERROR or above applies
    pub valid: bool,
    /// Max severity across reasons, INFO if none
    pub severity: Severity,
    /// Short rendering of the observed value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_preview: Option<String>,
    /// Problems detected at this path
    pub reasons: Vec<Reason>,
}

impl FieldReport {
    /// Build a field report, deriving severity and validity from reasons
    pub fn new(
        path: impl Into<String>,
        present: bool,
        value_preview: Option<String>,
        reasons: Vec<Reason>,
    ) -> Self {
        let path = path.into();
        let label = path.rsplit('/').next().unwrap_or_default().to_string();
        let mut field = Self {
            path,
            label,
            present,
            valid: false,
            severity: Severity::Info,
            value_preview,
            reasons,
        };
        field.recompute();
        field
    }

    /// Re-derive severity and validity after reasons changed
    pub(crate) fn recompute(&mut self) {
        self.severity = self
            .reasons
            .iter()
            .map(|r| r.severity())
            .max()
            .unwrap_or(Severity::Info);
        self.valid = self.present && self.severity < Severity::Error;
    }

    pub(crate) fn reasons_mut(&mut self) -> &mut Vec<Reason> {
        &mut self.reasons
    }
}

/// Terminal state of one block in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockStatus {
    /// No block-level errors (field-level findings may still exist)
    Ok,
    /// A block-level error prevented or degraded field analysis
    Error,
    /// The block was never attempted (budget or breaker)
    NotAudited,
}

impl BlockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStatus::Ok => "OK",
            BlockStatus::Error => "ERROR",
            BlockStatus::NotAudited => "NOT_AUDITED",
        }
    }
}

impl std::fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit result for a single artifact
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReport {
    /// Contract identifier of the artifact
    pub block_id: String,
    /// File path or URL the artifact was read from
    pub location: String,
    /// Version the artifact declares, or "unknown"
    pub schema_version: String,
    /// Whether the contract marks this artifact optional
    pub optional: bool,
    /// Terminal block state
    pub status: BlockStatus,
    /// Failures that prevented field analysis
    pub block_errors: Vec<Reason>,
    /// Per-path findings (empty when the block short-circuited)
    pub fields: Vec<FieldReport>,
}

impl BlockReport {
    /// A fully audited block; status OK because no block error occurred,
    /// even if individual fields carry WARN/ERROR reasons
    pub fn audited(
        block_id: impl Into<String>,
        location: impl Into<String>,
        schema_version: impl Into<String>,
        optional: bool,
        fields: Vec<FieldReport>,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            location: location.into(),
            schema_version: schema_version.into(),
            optional,
            status: BlockStatus::Ok,
            block_errors: Vec::new(),
            fields,
        }
    }

    /// A block whose artifact could not be read or parsed; no fields
    pub fn failed(
        block_id: impl Into<String>,
        location: impl Into<String>,
        optional: bool,
        error: Reason,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            location: location.into(),
            schema_version: "unknown".to_string(),
            optional,
            status: BlockStatus::Error,
            block_errors: vec![error],
            fields: Vec::new(),
        }
    }

    /// A block the run never attempted (time budget or open breaker)
    pub fn not_audited(
        block_id: impl Into<String>,
        location: impl Into<String>,
        optional: bool,
        error: Reason,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            location: location.into(),
            schema_version: "unknown".to_string(),
            optional,
            status: BlockStatus::NotAudited,
            block_errors: vec![error],
            fields: Vec::new(),
        }
    }
}

/// Operational log entry for discovery and registry steps
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    /// Step identifier (e.g. "registry-load", "directory-scan")
    pub step: String,
    /// Outcome keyword (e.g. "loaded", "skipped", "failed")
    pub outcome: String,
    /// Human-readable detail
    pub details: String,
    /// Facts backing the outcome
    pub evidence: Vec<Evidence>,
}

impl TraceEntry {
    pub fn new(
        step: impl Into<String>,
        outcome: impl Into<String>,
        details: impl Into<String>,
        evidence: Vec<Evidence>,
    ) -> Self {
        Self {
            step: step.into(),
            outcome: outcome.into(),
            details: details.into(),
            evidence,
        }
    }
}

/// Rollup counts over all field reasons and block errors
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Counts keyed by severity label; all severities always present
    pub by_severity: BTreeMap<String, u64>,
    /// Counts keyed by reason code label
    pub by_reason_code: BTreeMap<String, u64>,
}

impl Summary {
    /// Compute the rollup once, over a finished block list
    pub fn compute(blocks: &[BlockReport]) -> Self {
        let mut by_severity: BTreeMap<String, u64> = BTreeMap::new();
        for severity in [
            Severity::Info,
            Severity::Warn,
            Severity::Error,
            Severity::Critical,
        ] {
            by_severity.insert(severity.as_str().to_string(), 0);
        }
        let mut by_reason_code: BTreeMap<String, u64> = BTreeMap::new();

        let mut tally = |reason: &Reason| {
            *by_severity
                .entry(reason.severity().as_str().to_string())
                .or_insert(0) += 1;
            *by_reason_code
                .entry(reason.code().as_str().to_string())
                .or_insert(0) += 1;
        };

        for block in blocks {
            for error in &block.block_errors {
                tally(error);
            }
            for field in &block.fields {
                for reason in &field.reasons {
                    tally(reason);
                }
            }
        }

        Self {
            by_severity,
            by_reason_code,
        }
    }

    /// Count for one severity
    pub fn severity_count(&self, severity: Severity) -> u64 {
        self.by_severity
            .get(severity.as_str())
            .copied()
            .unwrap_or(0)
    }

    pub fn has_critical(&self) -> bool {
        self.severity_count(Severity::Critical) > 0
    }

    pub fn has_error(&self) -> bool {
        self.severity_count(Severity::Error) > 0
    }
}

/// Audit mode the run executed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditMode {
    Local,
    Live,
}

impl std::fmt::Display for AuditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditMode::Local => write!(f, "local"),
            AuditMode::Live => write!(f, "live"),
        }
    }
}

/// The complete, deterministic output of one audit run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Unique id of this run
    pub report_id: Uuid,
    /// local or live
    pub mode: AuditMode,
    /// Base directory or base URL audited
    pub target: String,
    /// Deterministic hash of the audited contract
    pub contract_hash: String,
    /// Run start timestamp
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
    /// Per-artifact results, sorted by blockId
    pub blocks: Vec<BlockReport>,
    /// Discovery/registry operational log
    pub trace: Vec<TraceEntry>,
    /// Severity and reason-code rollups
    pub summary: Summary,
}

impl AuditReport {
    /// Assemble the final report: restore total ordering by blockId and
    /// compute the rollup once
    pub fn assemble(
        mode: AuditMode,
        target: impl Into<String>,
        contract_hash: impl Into<String>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        mut blocks: Vec<BlockReport>,
        trace: Vec<TraceEntry>,
    ) -> Self {
        blocks.sort_by(|a, b| a.block_id.cmp(&b.block_id));
        let summary = Summary::compute(&blocks);
        Self {
            report_id: Uuid::new_v4(),
            mode,
            target: target.into(),
            contract_hash: contract_hash.into(),
            started_at,
            duration_ms,
            blocks,
            trace,
            summary,
        }
    }

    /// Minimal valid report for the last-resort crash path
    pub fn crash(mode: AuditMode, target: impl Into<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let reason = Reason::evidenced(
            ReasonCode::Unknown,
            "audit run aborted by an internal failure",
            vec![Evidence::new(
                "exception",
                "audit-run",
                Value::String(detail.clone()),
                "last-resort catch in the process entrypoint",
            )],
        )
        .escalate_to(Severity::Critical);

        let block = BlockReport::failed("(run)", "(none)", false, reason);
        Self::assemble(
            mode,
            target,
            String::new(),
            Utc::now(),
            0,
            vec![block],
            Vec::new(),
        )
    }
}
