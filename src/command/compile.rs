//! Per-file compile command synthesis.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::{CFile, CommandMode, Config, Cpu};
use crate::descriptor::descriptor_for;
use crate::error::{DriverError, Result};
use crate::options::per_file_options;
use crate::shell::quote;
use crate::template::expand_strict;

/// Resolve the object-file path for `cfile` under `cfg`.
///
/// If `cfile.obj` is non-empty it is used verbatim; otherwise the path
/// is derived by appending the descriptor's object extension to
/// `c_name`. In script-generation ("no absolute paths") mode the
/// derived path is stripped to its filename; external files are then
/// re-rooted under the intermediate output directory.
pub fn object_path(cfg: &Config, cfile: &CFile) -> PathBuf {
    if !cfile.obj.as_os_str().is_empty() {
        return cfile.obj.clone();
    }

    let descriptor = descriptor_for(cfg.compiler);
    let mut path = PathBuf::from(format!(
        "{}.{}",
        cfile.c_name.display(),
        descriptor.obj_ext
    ));

    if cfg.globals.gen_script {
        path = PathBuf::from(path.file_name().unwrap_or_default().to_os_string());
    }

    if cfile.flags.external {
        path = cfg
            .nimcache_dir
            .join(path.file_name().unwrap_or_default());
    }

    path
}

fn dependency_path(objfile: &std::path::Path) -> PathBuf {
    objfile.with_extension("d")
}

/// Resolve the `$vccplatform` binding: a `" --platform:<cpu>"` fragment
/// for the three recognized architectures, consumed only by VCC-family
/// templates.
pub fn vccplatform(cfg: &Config) -> String {
    match cfg.target_cpu {
        Cpu::X86 => " --platform:x86".to_string(),
        Cpu::Arm => " --platform:arm".to_string(),
        Cpu::Amd64 => " --platform:amd64".to_string(),
        Cpu::Other => String::new(),
    }
}

fn build_include_flags(cfg: &Config, descriptor: &crate::descriptor::CompilerDescriptor) -> String {
    if cfg.globals.gen_script {
        return String::new();
    }

    let mut parts = Vec::new();
    if !cfg.lib_path.as_os_str().is_empty() {
        parts.push(format!(
            "{}{}",
            descriptor.include_cmd,
            quote(&cfg.lib_path.display().to_string())
        ));
    }
    for inc in &cfg.c_includes {
        parts.push(format!(
            "{}{}",
            descriptor.include_cmd,
            quote(&inc.display().to_string())
        ));
    }
    if !cfg.project_path.as_os_str().is_empty() {
        parts.push(format!(
            "{}{}",
            descriptor.include_cmd,
            quote(&cfg.project_path.display().to_string())
        ));
    }
    parts.join(" ")
}

/// Synthesize the compile command for `cfile`.
///
/// `is_main` identifies the HCR main file and is forwarded to
/// [`per_file_options`] so PIC is suppressed for it in HCR builds (see
/// that function's docs). `produce_output` gates whether the
/// descriptor's `produce_asm` fragment is appended when
/// `globals.produce_asm` is set.
pub fn compile_cmd(cfg: &Config, cfile: &CFile, is_main: bool, produce_output: bool) -> Result<String> {
    let descriptor = descriptor_for(cfg.compiler);

    let source = cfile.c_name.to_string_lossy();
    let is_cpp = matches!(cfg.command_mode, CommandMode::CompileToCpp) && !source.ends_with(".c");
    let exe = if is_cpp {
        descriptor.cpp_compiler
    } else {
        descriptor.compiler_exe
    };
    if exe.is_empty() {
        return Err(DriverError::UnsupportedTarget {
            compiler: descriptor.name,
            missing: if is_cpp { "c++" } else { "c" },
        });
    }

    let suffix = if cfg.host_os.is_windows_family()
        || (cfg.globals.gen_script && cfg.target_os.is_windows_family())
    {
        ".exe"
    } else {
        ""
    };
    let compiler_path = format!("{exe}{suffix}");

    let mut options = per_file_options(cfg, descriptor, &cfile.nim_name, &source, is_main);
    if produce_output && cfg.globals.produce_asm && !descriptor.produce_asm.is_empty() {
        if !options.is_empty() {
            options.push(' ');
        }
        options.push_str(descriptor.produce_asm);
    }

    let include = build_include_flags(cfg, descriptor);
    let objfile = object_path(cfg, cfile);
    let dfile = dependency_path(&objfile);

    let file_q = quote(&source);
    let objfile_q = quote(&objfile.display().to_string());
    let dfile_q = quote(&dfile.display().to_string());
    let lib_q = quote(&cfg.lib_path.display().to_string());
    let vcc = vccplatform(cfg);

    let bindings: HashMap<&str, &str> = HashMap::from([
        ("$dfile", dfile_q.as_str()),
        ("$file", file_q.as_str()),
        ("$objfile", objfile_q.as_str()),
        ("$options", options.as_str()),
        ("$include", include.as_str()),
        ("$nim", ""),
        ("$lib", lib_q.as_str()),
        ("$vccplatform", vcc.as_str()),
    ]);

    let expanded = expand_strict(descriptor.compile_tmpl, &bindings);
    Ok(format!("{compiler_path} {expanded}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CFile, Config, Os};
    use crate::descriptor::CompilerKind;

    #[test]
    fn gcc_speed_optimized_compile_command() {
        let mut cfg = Config::new("proj");
        cfg.compiler = CompilerKind::Gcc;
        cfg.optimize_speed = true;
        cfg.target_os = Os::Linux;
        cfg.host_os = Os::Linux;
        cfg.lib_path = "/opt/lib".into();
        cfg.project_path = "/t/proj".into();

        let cfile = CFile::new("m", "/t/m.nim.c");
        let cmd = compile_cmd(&cfg, &cfile, true, false).unwrap();

        assert!(cmd.ends_with(
            "-c  -O3 -fno-ident  -I/opt/lib -I/t/proj -o /t/m.nim.c.o /t/m.nim.c"
        ));
        assert!(cmd.starts_with("gcc "));
    }

    #[test]
    fn unsupported_target_when_no_cpp_compiler() {
        let mut cfg = Config::new("proj");
        cfg.compiler = CompilerKind::Lcc;
        cfg.command_mode = CommandMode::CompileToCpp;
        let cfile = CFile::new("m", "/t/m.cpp");
        let err = compile_cmd(&cfg, &cfile, true, false).unwrap_err();
        assert!(matches!(err, DriverError::UnsupportedTarget { .. }));
    }

    #[test]
    fn external_object_is_rerooted_under_nimcache() {
        let mut cfg = Config::new("proj");
        cfg.nimcache_dir = "/t/cache".into();
        let mut cfile = CFile::new("m", "/src/ext/thing.c");
        cfile.flags.external = true;
        let obj = object_path(&cfg, &cfile);
        assert_eq!(obj, PathBuf::from("/t/cache/thing.c.o"));
    }
}
