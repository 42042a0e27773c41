//! Artifact Audit Agent
//!
//! An agent that verifies published JSON artifacts (market snapshots,
//! health blocks, pipeline manifests) against their declared contract and
//! reports every deviation with an evidence-backed reason code.
//!
//! ## Features
//!
//! - **CLI Support**: Full command-line interface for local and live audits
//! - **Path Enumeration**: Deterministic, capped flattening of schema-less
//!   JSON trees
//! - **Field Validation**: Generic sanity rules with a fixed precedence
//!   ladder (missing, nullish, empty, non-finite, timestamp freshness)
//! - **Evidence-Gated Reasons**: A reason never asserts a specific cause
//!   without proof; evidence-free reasons degrade to `UNKNOWN`
//! - **Schema Overrides**: Per-contract wildcard rules that relax paths
//! - **Resilient Live Mode**: Bounded concurrency, retry with backoff, a
//!   global circuit breaker and a wall-clock budget
//! - **Telemetry**: Prometheus metrics and structured tracing
//! - **Contract-Driven**: Registry-declared block specs with a directory
//!   scan fallback
//!
//! ## Architecture
//!
//! 1. **CLI** (`cli/`): Command-line interface with machine-readable
//!    output formats and CI exit-code gating.
//!
//! 2. **Contracts** (`contracts/`): The reason taxonomy, report model and
//!    discovery input shapes shared by every component.
//!
//! 3. **Engine** (`engine/`): Path enumerator, field validator, override
//!    matcher and the local/live audit drivers.
//!
//! 4. **Client** (`client/`): HTTP client with per-request timeout and a
//!    retry wrapper for transient upstream failures.
//!
//! 5. **Registry** (`registry.rs`): Contract discovery from a registry
//!    document or a directory scan.
//!
//! 6. **Handler** (`handler/`): Edge-function deployment surface.
//!
//! 7. **Telemetry** (`telemetry/`): Prometheus metrics registry.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Audit a local artifact mirror against its registry
//! artifact-audit audit --mode local --base ./public --registry registry.json
//!
//! # Audit the live site, failing CI on any CRITICAL finding
//! artifact-audit audit --mode live --url https://example.com/data \
//!     --registry registry.json --format github --fail-on critical
//!
//! # Show what an audit would cover
//! artifact-audit discover --base ./public
//! ```

// Core modules
pub mod cli;
pub mod client;
pub mod engine;
pub mod error;
pub mod handler;
pub mod registry;
pub mod telemetry;

// Contracts module - located at ../contracts relative to src/
#[path = "../contracts/mod.rs"]
pub mod contracts;

// Re-export contract types for external use
pub use contracts::{
    contract_hash, AuditLimits, AuditMode, AuditReport, BlockReport, BlockSpec, BlockStatus,
    Evidence, FieldReport, OverrideRule, Reason, ReasonCode, RegistryDoc, Severity, Summary,
    TraceEntry,
};

// Re-export engine types
pub use engine::{
    apply_overrides, enumerate, AuditEngine, EnumLimits, FieldValidator, LiveAuditor, LocalAuditor,
    ValueKind,
};

// Re-export client types
pub use client::{ArtifactClient, ClientConfig, FetchError};

// Re-export discovery
pub use registry::{load_registry, scan_directory, Discovery};

// Re-export CLI types for command-line usage
pub use cli::{AuditCli, ExitCode, FailOn, OutputFormat};

// Re-export error types
pub use error::AuditError;

// Re-export telemetry
pub use telemetry::{AuditMetrics, AuditMetricsRegistry};

/// Agent version (from Cargo.toml)
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Agent identifier
pub const AGENT_ID: &str = "artifact-audit-agent";
