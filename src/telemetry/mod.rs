//! Prometheus metrics for the Artifact Audit Agent
//!
//! - `artifact_audit_runs_total` (counter) - audit runs by mode
//! - `artifact_audit_blocks_total` (counter) - audited blocks by status
//! - `artifact_audit_reasons_total` (counter) - reasons by severity and code
//! - `artifact_audit_duration_seconds` (histogram) - run duration

use prometheus::{CounterVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;
use thiserror::Error;

use crate::contracts::AuditReport;

/// Telemetry errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Audit metrics registered against a shared registry
pub struct AuditMetrics {
    runs_total: CounterVec,
    blocks_total: CounterVec,
    reasons_total: CounterVec,
    duration_seconds: Histogram,
}

impl AuditMetrics {
    /// Create and register the metric families
    pub fn new(registry: &Registry) -> Result<Self> {
        let runs_total = CounterVec::new(
            Opts::new("runs_total", "Total audit runs").namespace("artifact_audit"),
            &["mode"],
        )?;

        let blocks_total = CounterVec::new(
            Opts::new("blocks_total", "Audited blocks by terminal status")
                .namespace("artifact_audit"),
            &["status"],
        )?;

        let reasons_total = CounterVec::new(
            Opts::new("reasons_total", "Reasons by severity and reason code")
                .namespace("artifact_audit"),
            &["severity", "reason_code"],
        )?;

        let duration_seconds = Histogram::with_opts(
            HistogramOpts::new("duration_seconds", "Audit run duration in seconds")
                .namespace("artifact_audit")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]),
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(blocks_total.clone()))?;
        registry.register(Box::new(reasons_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;

        Ok(Self {
            runs_total,
            blocks_total,
            reasons_total,
            duration_seconds,
        })
    }

    /// Observe one finished run
    pub fn record_report(&self, report: &AuditReport) {
        self.runs_total
            .with_label_values(&[&report.mode.to_string()])
            .inc();
        self.duration_seconds
            .observe(report.duration_ms as f64 / 1_000.0);

        for block in &report.blocks {
            self.blocks_total
                .with_label_values(&[block.status.as_str()])
                .inc();
        }

        for block in &report.blocks {
            for error in &block.block_errors {
                self.reasons_total
                    .with_label_values(&[error.severity().as_str(), error.code().as_str()])
                    .inc();
            }
            for field in &block.fields {
                for reason in &field.reasons {
                    self.reasons_total
                        .with_label_values(&[reason.severity().as_str(), reason.code().as_str()])
                        .inc();
                }
            }
        }
    }
}

/// Owns the registry plus the registered audit metrics
pub struct AuditMetricsRegistry {
    registry: Arc<Registry>,
    metrics: Arc<AuditMetrics>,
}

impl AuditMetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(AuditMetrics::new(&registry)?);
        Ok(Self { registry, metrics })
    }

    pub fn metrics(&self) -> Arc<AuditMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Encode the registry in the Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        encoder
            .encode_to_string(&self.registry.gather())
            .map_err(|e| TelemetryError::Encoding(e.to_string()))
    }
}
