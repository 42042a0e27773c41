//! CLI command definitions for the Artifact Audit Agent
//!
//! Clap-based definitions for auditing a contract against a local mirror
//! or a live base URL, inspecting discovery output, and serving the edge
//! handler.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::output::{render, OutputFormat};
use super::ExitCode;
use crate::client::{ArtifactClient, ClientConfig};
use crate::contracts::{AuditLimits, AuditReport, Summary};
use crate::engine::{AuditEngine, LiveAuditor, LocalAuditor};
use crate::error::AuditError;
use crate::registry::{load_registry, scan_directory, Discovery};

/// Artifact Audit Agent CLI
///
/// Verify published JSON artifacts against their declared contract and
/// report every deviation with an evidence-backed reason code.
#[derive(Parser, Debug)]
#[command(name = "artifact-audit")]
#[command(about = "Artifact Audit Agent - contract auditing for published JSON artifacts", long_about = None)]
#[command(version)]
pub struct AuditCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: AuditCommands,
}

/// Available audit commands
#[derive(Subcommand, Debug)]
pub enum AuditCommands {
    /// Audit artifacts against their declared contract
    Audit(AuditArgs),

    /// Resolve and print the block list without auditing
    ///
    /// Shows what a subsequent audit run would cover: the registry's
    /// features, or the artifacts a directory scan finds.
    Discover {
        /// Path to the registry document (json/yaml)
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Base directory to scan when no registry is given
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Run the edge-function handler
    Serve {
        /// Port to bind
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

/// Arguments for the audit command
#[derive(Parser, Debug)]
pub struct AuditArgs {
    /// Audit a local mirror or a live base URL
    #[arg(long, value_enum, default_value = "local")]
    pub mode: AuditModeArg,

    /// Base directory holding the artifact mirror (local mode)
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Base URL serving the artifacts (live mode)
    #[arg(long)]
    pub url: Option<String>,

    /// Path to the registry document (json/yaml)
    ///
    /// Local mode falls back to a directory scan when omitted; live mode
    /// requires it.
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Output format for the report
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Which findings fail the process
    #[arg(long, value_enum, default_value = "none")]
    pub fail_on: FailOn,

    /// Per-request timeout in live mode
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Maximum tree depth expanded per artifact
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Array elements visited per array
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Cap on enumerated entries per block
    #[arg(long)]
    pub max_fields_per_block: Option<usize>,

    /// Blocks audited per local run
    #[arg(long)]
    pub max_blocks: Option<usize>,

    /// Wall-clock budget for the whole run
    #[arg(long)]
    pub max_audit_time_ms: Option<u64>,

    /// Blocks audited per live run
    #[arg(long)]
    pub max_blocks_live: Option<usize>,
}

/// Audit execution mode
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum AuditModeArg {
    /// Read artifacts from a directory tree
    Local,
    /// Fetch artifacts from a base URL
    Live,
}

/// Exit-code gating policy
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum FailOn {
    /// Always exit 0
    #[default]
    None,
    /// Exit 2 when any CRITICAL reason exists
    Critical,
    /// Exit 2 on CRITICAL, 1 on ERROR
    Bad,
}

impl FailOn {
    /// Derive the exit code from the summary rollup
    pub fn exit_code(&self, summary: &Summary) -> ExitCode {
        match self {
            FailOn::None => ExitCode::Success,
            FailOn::Critical => {
                if summary.has_critical() {
                    ExitCode::CriticalFindings
                } else {
                    ExitCode::Success
                }
            }
            FailOn::Bad => {
                if summary.has_critical() {
                    ExitCode::CriticalFindings
                } else if summary.has_error() {
                    ExitCode::ErrorFindings
                } else {
                    ExitCode::Success
                }
            }
        }
    }
}

impl AuditArgs {
    /// Merge flag overrides into the default limits
    pub fn limits(&self) -> AuditLimits {
        let mut limits = AuditLimits::default();
        if let Some(v) = self.timeout_ms {
            limits.timeout_ms = v;
        }
        if let Some(v) = self.max_depth {
            limits.max_depth = v;
        }
        if let Some(v) = self.max_items {
            limits.max_items = v;
        }
        if let Some(v) = self.max_fields_per_block {
            limits.max_fields_per_block = v;
        }
        if let Some(v) = self.max_blocks {
            limits.max_blocks = v;
        }
        if let Some(v) = self.max_audit_time_ms {
            limits.max_audit_time_ms = v;
        }
        if let Some(v) = self.max_blocks_live {
            limits.max_blocks_live = v;
        }
        limits
    }
}

/// Execute the audit command
pub async fn execute_audit(args: &AuditArgs) -> Result<ExitCode, AuditError> {
    let limits = args.limits();
    let report = run_audit(args, limits).await?;

    render(&report, args.format)?;
    Ok(args.fail_on.exit_code(&report.summary))
}

async fn run_audit(args: &AuditArgs, limits: AuditLimits) -> Result<AuditReport, AuditError> {
    match args.mode {
        AuditModeArg::Local => {
            let base = args.base.as_ref().ok_or_else(|| {
                AuditError::invalid_input("--base is required in local mode")
            })?;

            let Discovery { specs, trace } = match &args.registry {
                Some(registry) => load_registry(registry)?,
                None => scan_directory(base)?,
            };

            let auditor = LocalAuditor::new(AuditEngine::new(limits), base);
            Ok(auditor.run(specs, trace))
        }
        AuditModeArg::Live => {
            let url = args.url.as_ref().ok_or_else(|| {
                AuditError::invalid_input("--url is required in live mode")
            })?;
            let registry = args.registry.as_ref().ok_or_else(|| {
                AuditError::invalid_input("--registry is required in live mode")
            })?;

            let Discovery { specs, trace } = load_registry(registry)?;

            let client = ArtifactClient::new(ClientConfig {
                timeout_ms: limits.timeout_ms,
                ..Default::default()
            });
            let auditor = LiveAuditor::new(AuditEngine::new(limits), client, url);
            Ok(auditor.run(specs, trace).await)
        }
    }
}

/// Execute the discover command
pub fn execute_discover(
    registry: Option<&PathBuf>,
    base: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode, AuditError> {
    let discovery = match (registry, base) {
        (Some(registry), _) => load_registry(registry)?,
        (None, Some(base)) => scan_directory(base)?,
        (None, None) => {
            return Err(AuditError::invalid_input(
                "discover needs --registry or --base",
            ))
        }
    };

    match format {
        OutputFormat::Table => {
            println!("{} block(s) discovered:", discovery.specs.len());
            for spec in &discovery.specs {
                let marker = if spec.optional { " (optional)" } else { "" };
                println!("  {} -> {}{}", spec.block_id, spec.mirror_path, marker);
            }
        }
        _ => {
            let json = serde_json::to_string_pretty(&discovery.specs)
                .map_err(|e| AuditError::SerializationError(e.to_string()))?;
            println!("{}", json);
        }
    }

    Ok(ExitCode::Success)
}
