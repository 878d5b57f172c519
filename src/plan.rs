//! Build-plan serialization, staleness detection, and replay
//! (component H).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DriverError, PlanStatus, Result};
use crate::executor::{self, Job};

/// The JSON-shaped build plan written after a build, sufficient to
/// replay the same compile+link sequence without the front end.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildPlan {
    /// `(source_path, compile_command)` pairs, non-cached files only.
    pub compile: Vec<(PathBuf, String)>,
    /// Every object file participating in the link, in link order.
    pub link: Vec<PathBuf>,
    pub linkcmd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmdline: Option<String>,
    /// `(path, sha1)` for every absolute file the build depended on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depfiles: Option<Vec<(PathBuf, String)>>,
    /// SHA-1 of the compiler executable that produced this plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nimexe: Option<String>,
}

/// Write `plan` as JSON to `path`.
pub fn write_plan(path: &Path, plan: &BuildPlan) -> Result<()> {
    let json = serde_json::to_string_pretty(plan).map_err(|e| DriverError::WriteFailed {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
    })?;
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    fs::write(path, json).map_err(|e| DriverError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and parse a previously written plan.
pub fn read_plan(path: &Path) -> Result<BuildPlan> {
    let text = fs::read_to_string(path).map_err(|_| DriverError::PlanMalformed {
        path: path.to_path_buf(),
        reason: "plan file could not be read".to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| DriverError::PlanMalformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Decide whether a plan at `path` is stale with respect to the
/// current invocation: `cmdline`, `nimexe`, and every `depfiles` entry
/// must be unchanged, and `expected_output` must exist. Any I/O or
/// parse failure is treated as staleness (with a warning), not a hard
/// error — re-running the front end is always a safe fallback.
pub fn changed_via_plan(
    path: &Path,
    expected_output: &Path,
    current_cmdline: &str,
    current_nimexe: &str,
) -> PlanStatus {
    if !expected_output.exists() {
        return PlanStatus::Stale;
    }

    let plan = match read_plan(path) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "plan unreadable, treating as stale");
            return PlanStatus::Stale;
        }
    };

    let Some(cmdline) = &plan.cmdline else { return PlanStatus::Stale };
    if cmdline != current_cmdline {
        return PlanStatus::Stale;
    }
    let Some(nimexe) = &plan.nimexe else { return PlanStatus::Stale };
    if nimexe != current_nimexe {
        return PlanStatus::Stale;
    }

    let Some(depfiles) = &plan.depfiles else { return PlanStatus::Stale };
    for (dep_path, recorded_hash) in depfiles {
        match crate::hash::sha1_file(dep_path) {
            Ok(hash) if &hash == recorded_hash => {}
            _ => return PlanStatus::Stale,
        }
    }

    PlanStatus::Fresh
}

/// Replay a plan: run every compile command through the parallel
/// executor, then the link command. Fails fatally on the first
/// encountered error, per the replayer contract.
pub fn run_plan(plan: &BuildPlan, processors: usize, verbosity: u8) -> Result<()> {
    let jobs: Vec<Job> = plan
        .compile
        .iter()
        .enumerate()
        .map(|(i, (path, cmd))| Job {
            index: i,
            command: cmd.clone(),
            label: Some(path.display().to_string()),
        })
        .collect();

    let results = executor::run_all(jobs, processors, verbosity, false, |_| {})
        .map_err(|_| DriverError::PlanMalformed {
            path: PathBuf::new(),
            reason: "failed to launch replayed compile jobs".to_string(),
        })?;
    if let Some(err) = executor::first_failure(&results) {
        return Err(err);
    }

    if !plan.linkcmd.is_empty() {
        let link_job = Job {
            index: 0,
            command: plan.linkcmd.clone(),
            label: None,
        };
        let link_results = executor::run_all(vec![link_job], 1, verbosity, false, |_| {})?;
        if let Some(err) = executor::first_failure(&link_results) {
            return Err(err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trips_through_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("proj.json");
        let plan = BuildPlan {
            compile: vec![(PathBuf::from("/t/m.c"), "gcc -c /t/m.c -o /t/m.o".into())],
            link: vec![PathBuf::from("/t/m.o")],
            linkcmd: "gcc -o /t/out /t/m.o".into(),
            cmdline: Some("ccdriver build".into()),
            depfiles: Some(vec![]),
            nimexe: Some("deadbeef".into()),
        };
        write_plan(&path, &plan).unwrap();
        let read_back = read_plan(&path).unwrap();
        assert_eq!(read_back.linkcmd, plan.linkcmd);
        assert_eq!(read_back.compile, plan.compile);
    }

    #[test]
    fn missing_plan_is_stale() {
        let tmp = TempDir::new().unwrap();
        let status = changed_via_plan(&tmp.path().join("nope.json"), &tmp.path().join("out"), "cmd", "exe");
        assert_eq!(status, PlanStatus::Stale);
    }

    #[test]
    fn mismatched_cmdline_is_stale() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        fs::write(&out, "x").unwrap();
        let plan_path = tmp.path().join("p.json");
        let plan = BuildPlan {
            cmdline: Some("old cmdline".into()),
            nimexe: Some("exe".into()),
            depfiles: Some(vec![]),
            ..Default::default()
        };
        write_plan(&plan_path, &plan).unwrap();
        let status = changed_via_plan(&plan_path, &out, "new cmdline", "exe");
        assert_eq!(status, PlanStatus::Stale);
    }

    #[test]
    fn fully_matching_plan_is_fresh() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        fs::write(&out, "x").unwrap();
        let plan_path = tmp.path().join("p.json");
        let plan = BuildPlan {
            cmdline: Some("same".into()),
            nimexe: Some("exe".into()),
            depfiles: Some(vec![]),
            ..Default::default()
        };
        write_plan(&plan_path, &plan).unwrap();
        let status = changed_via_plan(&plan_path, &out, "same", "exe");
        assert_eq!(status, PlanStatus::Fresh);
    }
}
