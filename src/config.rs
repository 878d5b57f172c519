//! The shared, process-wide configuration bundle a host assembles before
//! calling into the driver, plus the per-source-file state ([`CFile`])
//! that travels through compilation.
//!
//! `Config` is deliberately an owned value threaded explicitly through
//! every function rather than ambient global state — see the design
//! note on global mutable configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::descriptor::CompilerKind;

/// Target or host operating system family. Only the distinctions the
/// command synthesizer actually branches on are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    Linux,
    MacOsX,
    Other,
}

impl Os {
    /// Whether position-independent code must be requested explicitly
    /// for shared-library output on this OS.
    pub fn needs_pic(self) -> bool {
        !matches!(self, Os::Windows)
    }

    pub fn is_windows_family(self) -> bool {
        matches!(self, Os::Windows)
    }

    pub fn exe_suffix(self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            _ => "",
        }
    }
}

/// Target or host CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cpu {
    X86,
    Arm,
    Amd64,
    Other,
}

impl Cpu {
    pub fn name(self) -> &'static str {
        match self {
            Cpu::X86 => "i386",
            Cpu::Arm => "arm",
            Cpu::Amd64 => "amd64",
            Cpu::Other => "unknown",
        }
    }
}

/// What the generated sources actually are, which decides whether the
/// C or C++ half of a descriptor is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    CompileToC,
    CompileToCpp,
    CompileToOc,
    CompileToJs,
    CompileToLlvm,
    None,
}

/// Boolean switches that change which branch of command synthesis or
/// linking runs. Grouped into one struct so call sites read as
/// `cfg.globals.gen_static_lib` rather than a dozen loose fields.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub compile_only: bool,
    pub gen_script: bool,
    pub gen_mapping: bool,
    pub gen_static_lib: bool,
    pub gen_dyn_lib: bool,
    pub gen_gui_app: bool,
    pub list_cmd: bool,
    pub no_linking: bool,
    pub force_full_make: bool,
    pub produce_asm: bool,
    pub c_debug: bool,
    pub mixed_mode: bool,
    pub run: bool,
}

/// Per-file flags. `external` is an input; `cached` is written only by
/// the footprint oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CFileFlags {
    pub external: bool,
    pub cached: bool,
}

/// One generated (or externally supplied) translation unit plus its
/// per-file state.
#[derive(Debug, Clone)]
pub struct CFile {
    /// Logical module name used to look up `<name>.debug`/`.speed`/
    /// `.size`/`.always` per-module config overrides.
    pub nim_name: String,
    /// Absolute path of the source file.
    pub c_name: PathBuf,
    /// Explicit object path; empty means "derive from `c_name`".
    pub obj: PathBuf,
    pub flags: CFileFlags,
}

impl CFile {
    pub fn new(nim_name: impl Into<String>, c_name: impl Into<PathBuf>) -> Self {
        CFile {
            nim_name: nim_name.into(),
            c_name: c_name.into(),
            obj: PathBuf::new(),
            flags: CFileFlags::default(),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.flags.cached
    }
}

/// The shared configuration bundle. See module docs.
#[derive(Debug, Clone)]
pub struct Config {
    pub compiler: CompilerKind,
    pub linker_exe_override: Option<String>,

    /// Options accumulated by the host before any per-file assembly.
    pub compile_options: String,
    pub link_options: String,
    /// Options that arrived via the command line / config vars, which
    /// get substring-deduplicated against the running result when
    /// folded into `per_file_options` (see [`crate::options`]).
    pub compile_options_cmd: Vec<String>,
    pub link_options_cmd: Vec<String>,
    pub cfile_specific_options: HashMap<PathBuf, String>,

    /// Per-module overrides, keyed `"<nim_name>.<suffix>"` for
    /// `debug`/`speed`/`size`/`always`.
    pub config_vars: HashMap<String, String>,
    pub options_linker: Option<String>,

    pub target_os: Os,
    pub target_cpu: Cpu,
    pub host_os: Os,
    pub host_cpu: Cpu,

    pub command_mode: CommandMode,
    pub globals: GlobalOptions,
    pub optimize_speed: bool,
    pub optimize_size: bool,
    pub hcr_on: bool,

    pub verbosity: u8,
    pub number_of_processors: usize,

    pub lib_path: PathBuf,
    pub project_path: PathBuf,
    pub project_name: String,
    pub nimcache_dir: PathBuf,
    pub out_file: PathBuf,

    pub to_compile: Vec<CFile>,
    /// External objects to link, stored so that index 0 is the most
    /// recently added (new externals are inserted at the front; see
    /// [`Config::add_external_to_link`]).
    pub external_to_link: Vec<PathBuf>,
    pub c_libs: Vec<String>,
    pub c_linked_libs: Vec<String>,
    pub c_includes: Vec<PathBuf>,
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Config {
            compiler: CompilerKind::Gcc,
            linker_exe_override: None,
            compile_options: String::new(),
            link_options: String::new(),
            compile_options_cmd: Vec::new(),
            link_options_cmd: Vec::new(),
            cfile_specific_options: HashMap::new(),
            config_vars: HashMap::new(),
            options_linker: None,
            target_os: Os::Linux,
            target_cpu: Cpu::Amd64,
            host_os: Os::Linux,
            host_cpu: Cpu::Amd64,
            command_mode: CommandMode::CompileToC,
            globals: GlobalOptions::default(),
            optimize_speed: false,
            optimize_size: false,
            hcr_on: false,
            verbosity: 1,
            number_of_processors: 0,
            lib_path: PathBuf::new(),
            project_path: PathBuf::new(),
            project_name: project_name.into(),
            nimcache_dir: PathBuf::new(),
            out_file: PathBuf::new(),
            to_compile: Vec::new(),
            external_to_link: Vec::new(),
            c_libs: Vec::new(),
            c_linked_libs: Vec::new(),
            c_includes: Vec::new(),
        }
    }

    /// Insert a new external object at the front, giving LIFO ordering
    /// in the final link object list (see the object-order stability
    /// property).
    pub fn add_external_to_link(&mut self, obj: impl Into<PathBuf>) {
        self.external_to_link.insert(0, obj.into());
    }

    /// Add `flag` to the command-line-originated compile option list,
    /// deduplicating by substring search: if `flag` already occurs
    /// anywhere in the accumulated string, it is not added again. This
    /// mirrors the historical behavior in the design notes exactly —
    /// `--flag` and `--flagged` are considered to interfere.
    pub fn add_compile_option(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        let joined = self.compile_options_cmd.join(" ");
        if !joined.contains(&flag) {
            self.compile_options_cmd.push(flag);
        }
    }

    pub fn add_link_option(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        let joined = self.link_options_cmd.join(" ");
        if !joined.contains(&flag) {
            self.link_options_cmd.push(flag);
        }
    }

    /// Change the active compiler by textual name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::DriverError::UnknownCompiler`] listing
    /// every known descriptor name when `name` matches none of them.
    pub fn set_compiler(&mut self, name: &str) -> crate::error::Result<()> {
        let kind = crate::descriptor::kind_from_name(name);
        if kind == CompilerKind::None {
            return Err(crate::error::DriverError::UnknownCompiler {
                name: name.to_string(),
                known: CompilerKind::ALL
                    .iter()
                    .map(|k| crate::descriptor::descriptor_for(*k).name)
                    .collect(),
            });
        }
        self.compiler = kind;
        Ok(())
    }

    /// The full link object list in the order `call_linker` should use:
    /// externals (LIFO-inserted order), then every `to_compile` object
    /// in insertion order. `cached` only ever suppresses recompilation,
    /// never linking — a cached object's file still exists on disk and
    /// still has to be fed to the linker.
    pub fn link_object_order(&self) -> Vec<PathBuf> {
        let mut objs: Vec<PathBuf> = self.external_to_link.clone();
        for cfile in &self.to_compile {
            objs.push(crate::command::compile::object_path(self, cfile));
        }
        objs
    }

    /// Defined-symbol helper: the descriptor `name` of the active
    /// compiler, for callers mirroring the choice into their own
    /// preprocessor-define list.
    pub fn cdefs_for_active_kind(&self) -> &'static str {
        crate::descriptor::cdefs_for_active_kind(self.compiler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_compile_option_deduplicates_by_substring() {
        let mut cfg = Config::new("proj");
        cfg.add_compile_option("-Wall");
        cfg.add_compile_option("-Wall");
        cfg.add_compile_option("-Wall");
        assert_eq!(cfg.compile_options_cmd.len(), 1);
    }

    #[test]
    fn add_compile_option_substring_interference_is_preserved() {
        let mut cfg = Config::new("proj");
        cfg.add_compile_option("--flag");
        cfg.add_compile_option("--flagged");
        // "--flagged" already contains "--flag" as a substring after
        // the first push, so it is not added a second time.
        assert_eq!(cfg.compile_options_cmd, vec!["--flag".to_string()]);
    }

    #[test]
    fn external_to_link_is_lifo() {
        let mut cfg = Config::new("proj");
        cfg.add_external_to_link("a.o");
        cfg.add_external_to_link("b.o");
        cfg.add_external_to_link("c.o");
        assert_eq!(
            cfg.external_to_link,
            vec![PathBuf::from("c.o"), PathBuf::from("b.o"), PathBuf::from("a.o")]
        );
    }

    #[test]
    fn set_compiler_unknown_name_errors() {
        let mut cfg = Config::new("proj");
        let err = cfg.set_compiler("not-a-real-compiler").unwrap_err();
        match err {
            crate::error::DriverError::UnknownCompiler { name, known } => {
                assert_eq!(name, "not-a-real-compiler");
                assert!(!known.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn set_compiler_known_name_succeeds() {
        let mut cfg = Config::new("proj");
        cfg.set_compiler("clang_cl").unwrap();
        assert_eq!(cfg.compiler, CompilerKind::ClangCl);
    }
}
