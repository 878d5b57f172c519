//! The single chokepoint for reporting [`DriverError`] to the user.
//!
//! Every failure that reaches a human goes through [`report`]; nothing
//! else in the crate writes an error directly to stdout/stderr. This
//! keeps formatting (and any future machine-readable mode) in one
//! place instead of scattered `eprintln!` calls.

use miette::Report;

use crate::error::DriverError;

/// Render `err` to stderr using `miette`'s fancy formatter, including
/// its diagnostic code and any suggestion text.
pub fn report(err: &DriverError) {
    let report = Report::new(clone_for_report(err));
    eprintln!("{report:?}");
}

/// `miette::Diagnostic` requires `std::error::Error + Send + Sync +
/// 'static`; `DriverError` already satisfies that, but reporting takes
/// a borrow at call sites that still need to use `err` afterwards (for
/// logging, test assertions, etc), so we clone the structured payload
/// rather than consuming it.
fn clone_for_report(err: &DriverError) -> DriverError {
    match err {
        DriverError::UnknownCompiler { name, known } => DriverError::UnknownCompiler {
            name: name.clone(),
            known: known.clone(),
        },
        DriverError::UnsupportedTarget { compiler, missing } => DriverError::UnsupportedTarget {
            compiler,
            missing,
        },
        DriverError::WriteFailed { path, source } => DriverError::WriteFailed {
            path: path.clone(),
            source: std::io::Error::new(source.kind(), source.to_string()),
        },
        DriverError::ProcessFailed { command, exit_code, stdout, stderr } => DriverError::ProcessFailed {
            command: command.clone(),
            exit_code: *exit_code,
            stdout: stdout.clone(),
            stderr: stderr.clone(),
        },
        DriverError::PlanMalformed { path, reason } => DriverError::PlanMalformed {
            path: path.clone(),
            reason: reason.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_does_not_panic_on_every_variant() {
        report(&DriverError::UnknownCompiler {
            name: "xyz".into(),
            known: vec!["gcc", "clang"],
        });
        report(&DriverError::UnsupportedTarget {
            compiler: "lcc",
            missing: "c++",
        });
        report(&DriverError::ProcessFailed {
            command: "gcc -c a.c".into(),
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "error: a.c: No such file".into(),
        });
    }
}
