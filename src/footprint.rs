//! Footprint-based incremental build oracle (component E).
//!
//! Each external [`crate::config::CFile`] gets a content-addressed
//! fingerprint persisted next to its object file. A rebuild is skipped
//! only when the fingerprint is unchanged *and* the object still
//! exists; otherwise the stale object is deleted so a failed rebuild
//! doesn't leave old output lying around.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::command::compile::object_path;
use crate::config::{CFile, CommandMode, Config};
use crate::hash::{sha1_file, Fingerprint};

fn applies_to(cfg: &Config) -> bool {
    matches!(
        cfg.command_mode,
        CommandMode::CompileToC | CommandMode::CompileToCpp | CommandMode::CompileToOc | CommandMode::CompileToLlvm | CommandMode::None
    )
}

/// Path of the sibling footprint file for a given object path.
pub fn footprint_path(obj: &Path) -> PathBuf {
    PathBuf::from(format!("{}.sha1", obj.display()))
}

fn compute(cfg: &Config, cfile: &CFile, compile_command: &str) -> Result<String> {
    let source_hash = sha1_file(&cfile.c_name)
        .with_context(|| format!("failed to hash source {}", cfile.c_name.display()))?;

    let mut fp = Fingerprint::new();
    fp.update_str(&source_hash)
        .update_str(format!("{:?}", cfg.target_os).as_str())
        .update_str(cfg.target_cpu.name())
        .update_str(crate::descriptor::descriptor_for(cfg.compiler).name)
        .update_str(compile_command);
    Ok(fp.finish())
}

/// Check `cfile` against its stored footprint and update both the
/// footprint file and `cfile.flags.cached` accordingly.
///
/// Returns `Ok(true)` when the file needs to be (re)compiled. The new
/// footprint is written before the caller has actually recompiled
/// anything — a retry after a failed compile will see "unchanged" and
/// recompile only because the object was removed; both behaviors are
/// intentional (see the design notes on footprint write timing).
pub fn check_and_update(cfg: &Config, cfile: &mut CFile, compile_command: &str) -> Result<bool> {
    if !cfile.flags.external {
        // Only externally supplied sources are footprint-checked;
        // freshly generated sources are assumed to always need
        // recompilation and never set `cached`.
        cfile.flags.cached = false;
        return Ok(true);
    }

    if !applies_to(cfg) {
        cfile.flags.cached = true;
        return Ok(false);
    }

    let obj = object_path(cfg, cfile);
    let fp_file = footprint_path(&obj);
    let new_fp = compute(cfg, cfile, compile_command)?;

    let old_fp = fs::read_to_string(&fp_file).ok().map(|s| s.trim().to_string());
    let changed = old_fp.as_deref() != Some(new_fp.as_str());

    if let Some(parent) = fp_file.parent() {
        fs::create_dir_all(parent).ok();
    }
    fs::write(&fp_file, &new_fp).with_context(|| format!("failed to write {}", fp_file.display()))?;

    if changed {
        let _ = fs::remove_file(&obj);
        cfile.flags.cached = false;
        Ok(true)
    } else if obj.exists() {
        cfile.flags.cached = true;
        Ok(false)
    } else {
        cfile.flags.cached = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Os};
    use crate::descriptor::CompilerKind;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config, CFile) {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("m.c");
        fs::write(&src, "int main(void) { return 0; }").unwrap();
        let mut cfg = Config::new("proj");
        cfg.compiler = CompilerKind::Gcc;
        cfg.target_os = Os::Linux;
        let mut cfile = CFile::new("m", src);
        cfile.flags.external = true;
        (tmp, cfg, cfile)
    }

    #[test]
    fn first_run_always_recompiles() {
        let (_tmp, cfg, mut cfile) = setup();
        let changed = check_and_update(&cfg, &mut cfile, "gcc -c m.c -o m.o").unwrap();
        assert!(changed);
        assert!(!cfile.flags.cached);
    }

    #[test]
    fn unchanged_source_with_existing_object_is_cached() {
        let (_tmp, cfg, mut cfile) = setup();
        let obj = object_path(&cfg, &cfile);
        check_and_update(&cfg, &mut cfile, "gcc -c m.c -o m.o").unwrap();
        fs::write(&obj, b"fake object").unwrap();

        let mut cfile2 = cfile.clone();
        let changed = check_and_update(&cfg, &mut cfile2, "gcc -c m.c -o m.o").unwrap();
        assert!(!changed);
        assert!(cfile2.flags.cached);
    }

    #[test]
    fn changed_source_forces_recompile_and_deletes_object() {
        let (_tmp, cfg, mut cfile) = setup();
        let obj = object_path(&cfg, &cfile);
        check_and_update(&cfg, &mut cfile, "gcc -c m.c -o m.o").unwrap();
        fs::write(&obj, b"fake object").unwrap();

        fs::write(&cfile.c_name, "int main(void) { return 1; }").unwrap();
        let changed = check_and_update(&cfg, &mut cfile, "gcc -c m.c -o m.o").unwrap();
        assert!(changed);
        assert!(!obj.exists());
    }

    #[test]
    fn changing_compile_command_changes_footprint() {
        let (_tmp, cfg, mut cfile) = setup();
        let fp1 = compute(&cfg, &cfile, "gcc -c m.c -o m.o -O2").unwrap();
        let fp2 = compute(&cfg, &cfile, "gcc -c m.c -o m.o -O3").unwrap();
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn disabled_outside_compiling_modes() {
        let (_tmp, mut cfg, mut cfile) = setup();
        cfg.command_mode = CommandMode::CompileToJs;
        let changed = check_and_update(&cfg, &mut cfile, "whatever").unwrap();
        assert!(!changed);
        assert!(cfile.flags.cached);
    }
}
