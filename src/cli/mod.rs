//! CLI module for the Artifact Audit Agent
//!
//! Command dispatch, exit-code mapping, and the renderers for the four
//! report formats.

pub mod commands;
pub mod output;

pub use commands::{AuditArgs, AuditCli, AuditCommands, AuditModeArg, FailOn};
pub use output::OutputFormat;

use crate::error::AuditError;

/// Exit codes for CLI operations
///
/// `fail-on=none` always exits 0; `fail-on=critical` exits 2 on any
/// CRITICAL reason; `fail-on=bad` exits 2 on CRITICAL, else 1 on ERROR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// No gated findings
    Success = 0,
    /// ERROR-severity findings under fail-on=bad
    ErrorFindings = 1,
    /// CRITICAL findings under fail-on=critical or fail-on=bad
    CriticalFindings = 2,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Exit code for the last-resort crash path
///
/// A crash still produces a minimal valid report; it exits 0 only under
/// `fail-on=none`, else 1.
pub fn crash_exit_code(fail_on: FailOn) -> i32 {
    match fail_on {
        FailOn::None => 0,
        _ => 1,
    }
}

/// Run the CLI with the given arguments and return the exit code
pub async fn run(cli: AuditCli) -> Result<ExitCode, AuditError> {
    match &cli.command {
        AuditCommands::Audit(args) => commands::execute_audit(args).await,
        AuditCommands::Discover {
            registry,
            base,
            format,
        } => commands::execute_discover(registry.as_ref(), base.as_ref(), *format),
        AuditCommands::Serve { port } => {
            crate::handler::serve(*port).await?;
            Ok(ExitCode::Success)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::ErrorFindings), 1);
        assert_eq!(i32::from(ExitCode::CriticalFindings), 2);
    }

    #[test]
    fn test_crash_exit_codes() {
        assert_eq!(crash_exit_code(FailOn::None), 0);
        assert_eq!(crash_exit_code(FailOn::Critical), 1);
        assert_eq!(crash_exit_code(FailOn::Bad), 1);
    }
}
