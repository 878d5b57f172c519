//! Link command synthesis and the linker driver (components D/G).
//!
//! [`link_cmd`] synthesizes a single link invocation (static library or
//! normal executable/DLL link), falling back to a response file when
//! the assembled command line would exceed the platform's limit.
//! [`hcr_link_commands`] covers the hot-code-reload case, which needs
//! one command per object rather than one command for the whole link.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::descriptor::{descriptor_for, is_vs_compatible, CompilerKind};
use crate::error::{DriverError, Result};
use crate::shell::quote;
use crate::template::expand_strict;

use super::compile::vccplatform;

const RESPONSE_FILE_LIMIT_WINDOWS: usize = 8_000;
const RESPONSE_FILE_LIMIT_OTHER: usize = 32_000;

fn is_gcc_like(kind: CompilerKind) -> bool {
    !matches!(
        kind,
        CompilerKind::Vcc | CompilerKind::ClangCl | CompilerKind::Icl | CompilerKind::Bcc | CompilerKind::Dmc | CompilerKind::Wcc
    )
}

fn static_lib_path(cfg: &Config) -> PathBuf {
    if !cfg.out_file.as_os_str().is_empty() {
        return cfg.out_file.clone();
    }
    if is_vs_compatible(cfg.compiler, cfg.host_os.is_windows_family()) {
        PathBuf::from(format!("{}.lib", cfg.project_name))
    } else {
        PathBuf::from(format!("lib{}.a", cfg.project_name))
    }
}

fn quoted_objfiles(objfiles: &[PathBuf]) -> String {
    objfiles
        .iter()
        .map(|p| quote(&p.display().to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unconditional double-quoting, used for the static-library command
/// where the expected output always wraps `$libfile`/`$objfiles` in
/// quotes regardless of whether the path needs it.
fn force_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn force_quoted_objfiles(objfiles: &[PathBuf]) -> String {
    objfiles
        .iter()
        .map(|p| force_quote(&p.display().to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn linker_executable(cfg: &Config, descriptor: &crate::descriptor::CompilerDescriptor) -> Result<String> {
    let exe = cfg
        .linker_exe_override
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            if !descriptor.linker_exe.is_empty() {
                descriptor.linker_exe.to_string()
            } else {
                descriptor.compiler_exe.to_string()
            }
        });
    if exe.is_empty() {
        return Err(DriverError::UnsupportedTarget {
            compiler: descriptor.name,
            missing: "linker",
        });
    }
    let suffix = if cfg.host_os.is_windows_family() { ".exe" } else { "" };
    Ok(format!("{exe}{suffix}"))
}

fn link_options_string(cfg: &Config, descriptor: &crate::descriptor::CompilerDescriptor) -> String {
    let mut parts = Vec::new();
    if !cfg.link_options.is_empty() {
        parts.push(cfg.link_options.clone());
    }
    let mut joined = parts.join(" ");
    for extra in &cfg.link_options_cmd {
        if !joined.contains(extra.as_str()) {
            if !joined.is_empty() {
                joined.push(' ');
            }
            joined.push_str(extra);
        }
    }
    for dir in &cfg.c_libs {
        joined.push(' ');
        joined.push_str(descriptor.link_dir_cmd);
        joined.push_str(&quote(dir));
    }
    for lib in &cfg.c_linked_libs {
        joined.push(' ');
        joined.push_str(&descriptor.link_lib_cmd.replace("$1", lib));
    }
    if let Some(extra) = &cfg.options_linker {
        if !joined.contains(extra.as_str()) {
            joined.push(' ');
            joined.push_str(extra);
        }
    }
    joined.trim().to_string()
}

/// Synthesize the link command for `output`, linking `objfiles`.
///
/// When `cfg.globals.gen_static_lib` is set, `is_dll` is ignored and
/// the descriptor's `build_lib` template is used instead of `link_tmpl`.
/// Returns a command already response-file-substituted if the plain
/// form would exceed the platform length limit; the response file
/// itself is written as a side effect (deleted by the caller after the
/// command runs, per the response-file-fallback contract).
pub fn link_cmd(cfg: &Config, output: &Path, objfiles: &[PathBuf], is_dll: bool) -> Result<String> {
    let descriptor = descriptor_for(cfg.compiler);

    if cfg.globals.gen_static_lib {
        let libfile = static_lib_path(cfg);
        let libfile_q = force_quote(&libfile.display().to_string());
        let objs_q = force_quoted_objfiles(objfiles);
        let bindings: HashMap<&str, &str> =
            HashMap::from([("$libfile", libfile_q.as_str()), ("$objfiles", objs_q.as_str())]);
        return Ok(expand_strict(descriptor.build_lib, &bindings));
    }

    let linker_path = linker_executable(cfg, descriptor)?;

    let buildgui = if cfg.globals.gen_gui_app && cfg.target_os.is_windows_family() {
        descriptor.build_gui.to_string()
    } else {
        String::new()
    };
    let builddll = if is_dll { descriptor.build_dll.to_string() } else { String::new() };

    let mapfile = cfg
        .nimcache_dir
        .join(format!(
            "{}.map",
            output.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
        ));
    let mapfile_q = quote(&mapfile.display().to_string());

    let options = link_options_string(cfg, descriptor);
    let objs_q = quoted_objfiles(objfiles);
    let exefile_q = quote(&output.display().to_string());
    let lib_q = quote(&cfg.lib_path.display().to_string());
    let vcc = vccplatform(cfg);

    let bindings: HashMap<&str, &str> = HashMap::from([
        ("$builddll", builddll.as_str()),
        ("$mapfile", mapfile_q.as_str()),
        ("$buildgui", buildgui.as_str()),
        ("$options", options.as_str()),
        ("$objfiles", objs_q.as_str()),
        ("$exefile", exefile_q.as_str()),
        ("$nim", ""),
        ("$lib", lib_q.as_str()),
        ("$vccplatform", vcc.as_str()),
    ]);

    let mut cmd = format!("{linker_path} {}", expand_strict(descriptor.link_tmpl, &bindings));

    if cfg.hcr_on && is_vs_compatible(cfg.compiler, cfg.host_os.is_windows_family()) {
        let pdb = output.with_extension(format!("{}.pdb", pdb_timestamp()));
        cmd.push_str(&format!(" /link /PDB:{}", quote(&pdb.display().to_string())));
    }
    if cfg.globals.c_debug && cfg.compiler == CompilerKind::Vcc {
        cmd.push_str(" /Zi /FS /Od");
    }

    apply_response_file_fallback(cfg, &linker_path, cmd)
}

/// Nanosecond-resolution timestamp string for PDB filenames. As noted
/// in the design notes, two links in the same nanosecond would collide;
/// this is accepted as-is.
fn pdb_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let dur = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}", dur.as_nanos())
}

fn apply_response_file_fallback(cfg: &Config, linker_path: &str, cmd: String) -> Result<String> {
    let limit = if cfg.target_os.is_windows_family() {
        RESPONSE_FILE_LIMIT_WINDOWS
    } else {
        RESPONSE_FILE_LIMIT_OTHER
    };
    if cmd.len() <= limit {
        return Ok(cmd);
    }

    let tail = cmd
        .strip_prefix(linker_path)
        .map(str::trim_start)
        .unwrap_or(cmd.as_str());
    let tail = if is_gcc_like(cfg.compiler) {
        tail.replace('\\', "/")
    } else {
        tail.to_string()
    };

    let response_path = cfg.project_path.join(format!("{}_linkerArgs.txt", cfg.project_name));
    fs::write(&response_path, tail).map_err(|e| DriverError::WriteFailed {
        path: response_path.clone(),
        source: e,
    })?;

    Ok(format!("{linker_path} @{}", quote(&response_path.display().to_string())))
}

/// Remove the transient response file written by a fallback link, best
/// effort (a missing file is not an error).
pub fn cleanup_response_file(cfg: &Config) {
    let path = cfg.project_path.join(format!("{}_linkerArgs.txt", cfg.project_name));
    let _ = fs::remove_file(path);
}

/// One command in a hot-code-reload link: either a DLL link for a
/// non-cached object, or the final executable link for the main object.
pub struct HcrLinkStep {
    pub command: String,
    pub produced: PathBuf,
    pub is_main: bool,
}

/// Remove stale timestamped PDBs left behind by a previous HCR link of
/// `output` (`<stem>.<timestamp>.pdb`), best effort, so a VS-compatible
/// debugger doesn't see a growing pile of dead files across reloads.
fn clean_stale_pdbs(output: &Path) {
    let Some(dir) = output.parent() else { return };
    let Some(stem) = output.file_stem().map(|s| s.to_string_lossy().into_owned()) else { return };
    let prefix = format!("{stem}.");
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(".pdb") {
            let _ = fs::remove_file(entry.path());
        }
    }
}

/// Synthesize the per-object commands for HCR mode: one DLL link per
/// non-cached object (output into the intermediate directory) plus one
/// executable link for `main_obj`. For VS-compatible toolchains, stale
/// PDBs from a previous link of each output are removed first.
pub fn hcr_link_commands(cfg: &Config, objfiles: &[PathBuf], main_obj: &Path, output: &Path) -> Result<Vec<HcrLinkStep>> {
    let vs_compatible = is_vs_compatible(cfg.compiler, cfg.host_os.is_windows_family());
    let mut steps = Vec::new();
    for obj in objfiles {
        if obj == main_obj {
            continue;
        }
        let dll_name = obj
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let dll_path = cfg.nimcache_dir.join(format!(
            "{dll_name}{}",
            if cfg.target_os.is_windows_family() { ".dll" } else { ".so" }
        ));
        if vs_compatible {
            clean_stale_pdbs(&dll_path);
        }
        let command = link_cmd(cfg, &dll_path, std::slice::from_ref(obj), true)?;
        steps.push(HcrLinkStep {
            command,
            produced: dll_path,
            is_main: false,
        });
    }

    let main_exe = cfg.nimcache_dir.join(
        output
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("main")),
    );
    if vs_compatible {
        clean_stale_pdbs(&main_exe);
    }
    let main_obj_buf = main_obj.to_path_buf();
    let command = link_cmd(cfg, &main_exe, std::slice::from_ref(&main_obj_buf), false)?;
    steps.push(HcrLinkStep {
        command,
        produced: main_exe,
        is_main: true,
    });

    Ok(steps)
}

/// Copy the HCR main executable from the intermediate directory to its
/// intended output path, preserving Unix permission bits.
pub fn finalize_hcr_main(built_in_cache: &Path, output: &Path) -> Result<()> {
    fs::copy(built_in_cache, output).map_err(|e| DriverError::WriteFailed {
        path: output.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = fs::metadata(built_in_cache) {
            let _ = fs::set_permissions(output, fs::Permissions::from_mode(meta.permissions().mode()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn vcc_static_lib_command() {
        let mut cfg = Config::new("proj");
        cfg.compiler = CompilerKind::Vcc;
        cfg.globals.gen_static_lib = true;
        let objs = vec![PathBuf::from("a.obj"), PathBuf::from("b.obj")];
        let cmd = link_cmd(&cfg, Path::new("proj.lib"), &objs, false).unwrap();
        assert_eq!(cmd, "lib /OUT:\"proj.lib\" \"a.obj\" \"b.obj\"");
    }

    #[test]
    fn gcc_gui_link_has_mwindows() {
        let mut cfg = Config::new("proj");
        cfg.compiler = CompilerKind::Gcc;
        cfg.target_os = crate::config::Os::Windows;
        cfg.globals.gen_gui_app = true;
        let objs = vec![PathBuf::from("m.o")];
        let cmd = link_cmd(&cfg, Path::new("out.exe"), &objs, false).unwrap();
        assert!(cmd.contains(" -mwindows"));
    }

    #[test]
    fn hcr_link_commands_removes_stale_pdbs_for_vs_compatible() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut cfg = Config::new("proj");
        cfg.compiler = CompilerKind::Vcc;
        cfg.host_os = crate::config::Os::Windows;
        cfg.target_os = crate::config::Os::Windows;
        cfg.hcr_on = true;
        cfg.nimcache_dir = tmp.path().to_path_buf();

        let main_obj = tmp.path().join("main.obj");
        let other_obj = tmp.path().join("mod.obj");
        let output = tmp.path().join("main.exe");

        let stale_main_pdb = tmp.path().join("main.111.pdb");
        let stale_dll_pdb = tmp.path().join("mod.222.pdb");
        fs::write(&stale_main_pdb, b"old").unwrap();
        fs::write(&stale_dll_pdb, b"old").unwrap();

        let objfiles = vec![main_obj.clone(), other_obj];
        hcr_link_commands(&cfg, &objfiles, &main_obj, &output).unwrap();

        assert!(!stale_main_pdb.exists());
        assert!(!stale_dll_pdb.exists());
    }

    #[test]
    fn response_file_fallback_triggers_past_limit() {
        let mut cfg = Config::new("proj");
        cfg.compiler = CompilerKind::Gcc;
        cfg.project_path = std::env::temp_dir();
        let objs: Vec<PathBuf> = (0..2000)
            .map(|i| PathBuf::from(format!("/some/long/path/obj_{i}.o")))
            .collect();
        let cmd = link_cmd(&cfg, Path::new("out"), &objs, false).unwrap();
        assert!(cmd.contains("_linkerArgs.txt"));
        assert!(cmd.contains(" @"));
        cleanup_response_file(&cfg);
    }
}
