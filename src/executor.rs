//! Bounded-parallelism command executor (component F).
//!
//! Mirrors the teacher's approach of sizing a `rayon` scoped pool from
//! the configured processor count, falling back to the host's CPU
//! count when that's zero. Single-processor mode bypasses rayon
//! entirely: it has a different failure contract (stop immediately,
//! don't let already-started work finish) from the bounded-parallel
//! case.

use std::sync::Mutex;

use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use crate::error::{DriverError, Result};
use crate::process::process_from_command;

/// One job to run: an index (for stable result ordering), a command
/// string, and an optional short label used for the verbosity-1
/// pretty-print callback.
#[derive(Debug, Clone)]
pub struct Job {
    pub index: usize,
    pub command: String,
    pub label: Option<String>,
}

/// Outcome of a single job.
pub struct JobResult {
    pub index: usize,
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run `jobs` with up to `processors` concurrent child processes
/// (`0` auto-detects via `num_cpus::get()`), honoring `verbosity`:
/// `>=2` or `list_cmd=true` echoes every command before running it,
/// `1` invokes `pretty` per job, `0` is silent.
///
/// Returns every job's result; callers decide whether to treat any
/// failure as fatal. In bounded-parallel mode, processes already
/// spawned at the time of a failure are allowed to finish; no new ones
/// are started once a failure has been observed only when
/// `stop_on_failure` is `true` for the single-processor path — the
/// parallel path drains by design (see the concurrency model).
pub fn run_all<F>(
    jobs: Vec<Job>,
    processors: usize,
    verbosity: u8,
    list_cmd: bool,
    pretty: F,
) -> Result<Vec<JobResult>>
where
    F: Fn(&Job) + Sync,
{
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let echo = verbosity >= 2 || list_cmd;
    let n = if processors == 0 { num_cpus::get() } else { processors };

    if n <= 1 {
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            if echo {
                println_command(&job.command);
            } else if verbosity == 1 {
                pretty(&job);
            }
            let result = run_one(&job)?;
            let failed = !result.success;
            results.push(result);
            if failed {
                break;
            }
        }
        return Ok(results);
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map_err(|e| DriverError::WriteFailed {
            path: std::path::PathBuf::from("<thread pool>"),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?;

    let results = Mutex::new(Vec::with_capacity(jobs.len()));
    pool.scope(|scope| {
        for job in jobs {
            let results = &results;
            let pretty = &pretty;
            scope.spawn(move |_| {
                if echo {
                    println_command(&job.command);
                } else if verbosity == 1 {
                    pretty(&job);
                }
                let result = match run_one(&job) {
                    Ok(result) => result,
                    // A launch failure (not a nonzero exit) still has to
                    // surface through `first_failure`, or a build whose
                    // compiler binary is missing would silently report
                    // success.
                    Err(DriverError::ProcessFailed { command, exit_code, stdout, stderr }) => {
                        warn!(command = %command, "job failed to launch");
                        JobResult { index: job.index, command, success: false, exit_code, stdout, stderr }
                    }
                    Err(e) => {
                        warn!(error = %e, command = %job.command, "job failed to launch");
                        JobResult {
                            index: job.index,
                            command: job.command.clone(),
                            success: false,
                            exit_code: None,
                            stdout: String::new(),
                            stderr: e.to_string(),
                        }
                    }
                };
                results.lock().unwrap().push(result);
            });
        }
    });

    let mut results = results.into_inner().unwrap();
    results.sort_by_key(|r| r.index);
    Ok(results)
}

fn println_command(command: &str) {
    println!("{command}");
}

fn run_one(job: &Job) -> Result<JobResult> {
    debug!(command = %job.command, "spawning");
    let pb = process_from_command(&job.command);
    let output = pb.exec().map_err(|e| DriverError::ProcessFailed {
        command: job.command.clone(),
        exit_code: None,
        stdout: String::new(),
        stderr: e.to_string(),
    })?;

    Ok(JobResult {
        index: job.index,
        command: job.command.clone(),
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Raise the first failed job (if any) into a [`DriverError`], after
/// the full batch has run (drain semantics).
pub fn first_failure(results: &[JobResult]) -> Option<DriverError> {
    results.iter().find(|r| !r.success).map(|r| DriverError::ProcessFailed {
        command: r.command.clone(),
        exit_code: r.exit_code,
        stdout: r.stdout.clone(),
        stderr: r.stderr.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_job_list_succeeds_trivially() {
        let results = run_all(Vec::new(), 2, 0, false, |_| {}).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn sequential_mode_stops_after_first_failure() {
        let jobs = vec![
            Job { index: 0, command: "true".into(), label: None },
            Job { index: 1, command: "false".into(), label: None },
            Job { index: 2, command: "true".into(), label: None },
        ];
        let results = run_all(jobs, 1, 0, false, |_| {}).unwrap();
        assert_eq!(results.len(), 2);
        assert!(first_failure(&results).is_some());
    }

    #[test]
    fn parallel_mode_surfaces_launch_failure() {
        let jobs = vec![
            Job { index: 0, command: "true".into(), label: None },
            Job { index: 1, command: "definitely-not-a-real-binary-xyz".into(), label: None },
        ];
        let results = run_all(jobs, 4, 0, false, |_| {}).unwrap();
        assert_eq!(results.len(), 2);
        assert!(first_failure(&results).is_some());
    }

    #[test]
    fn parallel_mode_runs_every_job() {
        let jobs = vec![
            Job { index: 0, command: "true".into(), label: None },
            Job { index: 1, command: "true".into(), label: None },
            Job { index: 2, command: "true".into(), label: None },
        ];
        let results = run_all(jobs, 4, 0, false, |_| {}).unwrap();
        assert_eq!(results.len(), 3);
        assert!(first_failure(&results).is_none());
    }
}
