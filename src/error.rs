//! Structured errors for the driver, one variant per row of the error
//! handling table: unknown compiler, unsupported target, write failures,
//! failed child processes, and malformed build plans.
//!
//! `plan_stale` is deliberately not represented here: `changed_via_plan?`
//! (see [`crate::plan::changed_via_plan`]) returns a [`PlanStatus`] value,
//! not an error, since a stale plan is a signal to re-run the front end,
//! not a failure.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Everything that can go wrong inside the driver.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum DriverError {
    /// `set_compiler` was given a name that matches no known descriptor.
    #[error("unknown compiler `{name}`")]
    #[diagnostic(code(ccdriver::unknown_compiler))]
    UnknownCompiler {
        name: String,
        /// Every descriptor `name` field, for the "did you mean" list.
        known: Vec<&'static str>,
    },

    /// The chosen toolchain has no executable for the requested mode
    /// (e.g. no C++ driver while compiling in `compile_to_cpp` mode).
    #[error("compiler `{compiler}` does not support this build (no {missing} executable configured)")]
    #[diagnostic(code(ccdriver::unsupported_target))]
    UnsupportedTarget {
        compiler: &'static str,
        missing: &'static str,
    },

    /// A script, mapping, plan, or footprint file could not be written.
    #[error("failed to write `{path}`")]
    #[diagnostic(code(ccdriver::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A child compiler/linker process returned non-zero or failed to
    /// launch. Carries the full command and captured output so the
    /// diagnostic can reproduce it verbatim.
    #[error("command failed: {command}")]
    #[diagnostic(code(ccdriver::process_failed), help("{}", process_failure_help(exit_code, stdout, stderr)))]
    ProcessFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The replayer found a plan file with missing fields or the wrong
    /// shape.
    #[error("malformed build plan at `{path}`")]
    #[diagnostic(code(ccdriver::plan_malformed))]
    PlanMalformed {
        path: PathBuf,
        reason: String,
    },
}

/// Render the `exit_code`/`stdout`/`stderr` of a [`DriverError::ProcessFailed`]
/// as `help` text, since `miette`'s fancy report only prints the `#[error]`
/// line and the command on its own gives no clue why it failed.
fn process_failure_help(exit_code: &Option<i32>, stdout: &str, stderr: &str) -> String {
    let mut out = match exit_code {
        Some(code) => format!("exit code: {code}\n"),
        None => "failed to launch\n".to_string(),
    };
    if !stdout.trim().is_empty() {
        out.push_str("--- stdout ---\n");
        out.push_str(stdout.trim_end());
        out.push('\n');
    }
    if !stderr.trim().is_empty() {
        out.push_str("--- stderr ---\n");
        out.push_str(stderr.trim_end());
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Result of `changed_via_plan?`. Staleness is a signal, not a failure:
/// the host re-runs the front end rather than aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    Fresh,
    Stale,
}

impl PlanStatus {
    pub fn is_stale(self) -> bool {
        matches!(self, PlanStatus::Stale)
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic as _;

    #[test]
    fn process_failed_help_includes_captured_output() {
        let err = DriverError::ProcessFailed {
            command: "gcc -c a.c".into(),
            exit_code: Some(1),
            stdout: "compiling a.c".into(),
            stderr: "a.c:1: error: missing semicolon".into(),
        };
        let help = err.help().expect("help text").to_string();
        assert!(help.contains("exit code: 1"));
        assert!(help.contains("compiling a.c"));
        assert!(help.contains("missing semicolon"));
    }

    #[test]
    fn process_failed_help_reports_launch_failure_without_exit_code() {
        let err = DriverError::ProcessFailed {
            command: "not-a-real-binary".into(),
            exit_code: None,
            stdout: String::new(),
            stderr: "No such file or directory".into(),
        };
        let help = err.help().expect("help text").to_string();
        assert!(help.contains("failed to launch"));
        assert!(help.contains("No such file or directory"));
    }
}
