//! Artifact Audit Agent CLI
//!
//! Command-line interface for the Artifact Audit Agent.
//!
//! # Usage
//!
//! ```bash
//! # Audit a local artifact mirror
//! artifact-audit audit --mode local --base ./public --registry registry.json
//!
//! # Audit the live site with CI gating
//! artifact-audit audit --mode live --url https://example.com/data \
//!     --registry registry.json --fail-on bad
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success, or gated findings suppressed by --fail-on none
//! - 1: ERROR findings under --fail-on bad, or an internal failure
//! - 2: CRITICAL findings under --fail-on critical or --fail-on bad

use clap::Parser;

use artifact_audit::cli::{self, AuditCli, AuditCommands, FailOn};
use artifact_audit::contracts::{AuditMode, AuditReport};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    // Parse CLI arguments
    let cli = AuditCli::parse();
    let fail_on = fail_on_of(&cli);

    // Run the CLI; the last-resort catch below still emits a minimal
    // valid report so CI consumers always see structured output.
    let exit_code: i32 = match cli::run(cli).await {
        Ok(code) => code.into(),
        Err(error) => {
            eprintln!("Error: {}", error);
            let report = AuditReport::crash(AuditMode::Local, "(unavailable)", error.to_string());
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(encode_error) => eprintln!("Error: {}", encode_error),
            }
            cli::crash_exit_code(fail_on)
        }
    };

    std::process::exit(exit_code);
}

/// The gating policy in effect, for the crash path
fn fail_on_of(cli: &AuditCli) -> FailOn {
    match &cli.command {
        AuditCommands::Audit(args) => args.fail_on,
        _ => FailOn::None,
    }
}
