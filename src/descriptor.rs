//! The compiler-descriptor registry: a closed, totally defined table
//! mapping each supported toolchain to the command templates and flags
//! that drive [`crate::command`].
//!
//! Several descriptors are expressed as small mutations of a base entry
//! (`clang` derives from `llvm_gcc` derives from `gcc`; `clang_cl`/`icl`
//! derive from `vcc`; `icc` derives from `gcc`). The table is built once
//! behind a [`std::sync::OnceLock`] so lookups after the first call are
//! O(1) map accesses rather than repeated derivation.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Closed set of back-end toolchain variants. `None` is a sentinel for
/// "no compiler chosen yet" and must never be used as a descriptor
/// lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompilerKind {
    Gcc,
    SwitchGcc,
    LlvmGcc,
    Clang,
    Lcc,
    Bcc,
    Dmc,
    Wcc,
    Vcc,
    Tcc,
    Pcc,
    Ucc,
    Icl,
    Icc,
    ClangCl,
    /// Sentinel: no compiler has been chosen.
    None,
}

impl CompilerKind {
    /// Every real (non-sentinel) kind, in table-definition order.
    pub const ALL: &'static [CompilerKind] = &[
        CompilerKind::Gcc,
        CompilerKind::SwitchGcc,
        CompilerKind::LlvmGcc,
        CompilerKind::Clang,
        CompilerKind::Lcc,
        CompilerKind::Bcc,
        CompilerKind::Dmc,
        CompilerKind::Wcc,
        CompilerKind::Vcc,
        CompilerKind::Tcc,
        CompilerKind::Pcc,
        CompilerKind::Ucc,
        CompilerKind::Icl,
        CompilerKind::Icc,
        CompilerKind::ClangCl,
    ];
}

/// Capability flags a toolchain may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompilerProp {
    SwitchRange,
    ComputedGoto,
    Cpp,
    Assume,
    GcGuard,
    GnuAsm,
    Declspec,
    Attribute,
}

/// Immutable per-kind record describing one toolchain's invocation
/// conventions. See module docs for how derived entries are built.
#[derive(Debug, Clone)]
pub struct CompilerDescriptor {
    pub kind: CompilerKind,
    /// Short textual id; also the conditional-compilation symbol defined
    /// for this toolchain (see [`cdefs_for_kind`]).
    pub name: &'static str,
    pub obj_ext: &'static str,

    pub opt_speed: &'static str,
    pub opt_size: &'static str,
    pub debug: &'static str,

    /// Empty string means "no executable of this kind" (e.g. a C-only
    /// toolchain has no `cpp_compiler`), which the command synthesizer
    /// turns into `UnsupportedTarget`.
    pub compiler_exe: &'static str,
    pub cpp_compiler: &'static str,
    /// Empty means "use the compiler executable as the linker driver".
    pub linker_exe: &'static str,

    pub compile_tmpl: &'static str,
    pub link_tmpl: &'static str,

    pub build_gui: &'static str,
    pub build_dll: &'static str,
    pub build_lib: &'static str,

    pub include_cmd: &'static str,
    pub link_dir_cmd: &'static str,
    /// Contains a single `$1` placeholder for the library name.
    pub link_lib_cmd: &'static str,

    pub pic: &'static str,

    pub asm_stmt_fmt: &'static str,
    pub struct_stmt_fmt: &'static str,
    pub produce_asm: &'static str,

    pub props: BTreeSet<CompilerProp>,
}

impl CompilerDescriptor {
    fn props(list: &[CompilerProp]) -> BTreeSet<CompilerProp> {
        list.iter().copied().collect()
    }
}

fn gcc_base() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Gcc,
        name: "gcc",
        obj_ext: "o",
        opt_speed: "-O3 -fno-ident",
        opt_size: "-Os -fno-ident",
        debug: "-g3",
        compiler_exe: "gcc",
        cpp_compiler: "g++",
        linker_exe: "",
        compile_tmpl: "-c  $options  $include -o $objfile $file",
        link_tmpl: "-o $exefile $objfiles $options$buildgui$builddll",
        build_gui: " -mwindows",
        build_dll: " -shared",
        build_lib: "ar rcs $libfile $objfiles",
        include_cmd: "-I",
        link_dir_cmd: "-L",
        link_lib_cmd: "-l$1",
        pic: "-fPIC",
        asm_stmt_fmt: "__asm__($1);$n",
        struct_stmt_fmt: "$1 __attribute__((packed))",
        produce_asm: "-S",
        props: CompilerDescriptor::props(&[
            CompilerProp::SwitchRange,
            CompilerProp::ComputedGoto,
            CompilerProp::GnuAsm,
            CompilerProp::Attribute,
        ]),
    }
}

fn switch_gcc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::SwitchGcc,
        name: "switch_gcc",
        compiler_exe: "aarch64-none-elf-gcc",
        cpp_compiler: "aarch64-none-elf-g++",
        ..gcc_base()
    }
}

fn llvm_gcc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::LlvmGcc,
        name: "llvm_gcc",
        compiler_exe: "llvm-gcc",
        cpp_compiler: "llvm-g++",
        linker_exe: "llvm-gcc",
        ..gcc_base()
    }
}

fn clang() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Clang,
        name: "clang",
        compiler_exe: "clang",
        cpp_compiler: "clang++",
        linker_exe: "clang",
        ..llvm_gcc()
    }
}

fn lcc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Lcc,
        name: "lcc",
        compiler_exe: "lcc",
        cpp_compiler: "",
        linker_exe: "lcclnk",
        opt_speed: "-O",
        opt_size: "-O",
        debug: "-g",
        compile_tmpl: "-c  $options  $include -o $objfile $file",
        link_tmpl: "-o $exefile $objfiles $options",
        build_gui: "",
        build_dll: " -dll",
        build_lib: "lcclib -o $libfile $objfiles",
        pic: "",
        produce_asm: "-S",
        props: CompilerDescriptor::props(&[CompilerProp::SwitchRange]),
        ..gcc_base()
    }
}

fn bcc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Bcc,
        name: "bcc",
        obj_ext: "obj",
        opt_speed: "-O2",
        opt_size: "-O1",
        debug: "-v",
        compiler_exe: "bcc32c",
        cpp_compiler: "bcc32c",
        linker_exe: "ilink32",
        compile_tmpl: "-c  $options  $include -o$objfile $file",
        link_tmpl: "$objfiles,$exefile,,$options",
        build_gui: " -tW",
        build_dll: " -tWD",
        build_lib: "tlib $libfile /a $objfiles",
        include_cmd: "-I",
        link_dir_cmd: "-L",
        link_lib_cmd: "$1.lib",
        pic: "",
        produce_asm: "-S",
        props: CompilerDescriptor::props(&[CompilerProp::Declspec]),
        ..gcc_base()
    }
}

fn dmc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Dmc,
        name: "dmc",
        obj_ext: "obj",
        opt_speed: "-o",
        opt_size: "-o",
        debug: "-g",
        compiler_exe: "dmc",
        cpp_compiler: "dmc",
        linker_exe: "",
        compile_tmpl: "-c  $options  $include -o$objfile $file",
        link_tmpl: "-o$exefile $objfiles $options",
        build_gui: " -L/su:windows",
        build_dll: " -WD",
        build_lib: "lib -c $libfile $objfiles",
        include_cmd: "-I",
        link_dir_cmd: "-L",
        link_lib_cmd: "$1.lib",
        pic: "",
        produce_asm: "-cod",
        props: CompilerDescriptor::props(&[CompilerProp::Declspec]),
        ..gcc_base()
    }
}

fn wcc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Wcc,
        name: "wcc",
        obj_ext: "obj",
        opt_speed: "-ox",
        opt_size: "-os",
        debug: "-d2",
        compiler_exe: "wcl386",
        cpp_compiler: "wcl386",
        linker_exe: "wcl386",
        compile_tmpl: "-c  $options  $include -fo=$objfile $file",
        link_tmpl: "-fe=$exefile $objfiles $options",
        build_gui: " -bg",
        build_dll: " -bd",
        build_lib: "wlib -q $libfile $objfiles",
        include_cmd: "-i=",
        link_dir_cmd: "-l=",
        link_lib_cmd: "$1.lib",
        pic: "",
        produce_asm: "-fr",
        props: CompilerDescriptor::props(&[CompilerProp::Declspec]),
        ..gcc_base()
    }
}

fn vcc_base() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Vcc,
        name: "vcc",
        obj_ext: "obj",
        opt_speed: "/Ox",
        opt_size: "/O1",
        debug: "/Zi /FS /Od",
        compiler_exe: "cl",
        cpp_compiler: "cl",
        linker_exe: "link",
        compile_tmpl: "/c$vccplatform  $options  $include /Fo$objfile $file",
        link_tmpl: "/OUT:$exefile $objfiles $options$buildgui$builddll",
        build_gui: " /SUBSYSTEM:WINDOWS",
        build_dll: " /DLL",
        build_lib: "lib /OUT:$libfile $objfiles",
        include_cmd: "/I",
        link_dir_cmd: "/LIBPATH:",
        link_lib_cmd: "$1.lib",
        pic: "",
        asm_stmt_fmt: "__asm{$1}",
        struct_stmt_fmt: "#pragma pack(push, 1)$n$1$n#pragma pack(pop)",
        produce_asm: "/FA",
        props: CompilerDescriptor::props(&[CompilerProp::Declspec, CompilerProp::GcGuard]),
    }
}

fn clang_cl() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::ClangCl,
        name: "clang_cl",
        compiler_exe: "clang-cl",
        cpp_compiler: "clang-cl",
        linker_exe: "lld-link",
        ..vcc_base()
    }
}

fn icl() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Icl,
        name: "icl",
        compiler_exe: "icl",
        cpp_compiler: "icl",
        linker_exe: "xilink",
        ..vcc_base()
    }
}

fn icc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Icc,
        name: "icc",
        compiler_exe: "icc",
        cpp_compiler: "icpc",
        linker_exe: "icc",
        ..gcc_base()
    }
}

fn tcc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Tcc,
        name: "tcc",
        compiler_exe: "tcc",
        cpp_compiler: "",
        linker_exe: "tcc",
        opt_speed: "",
        opt_size: "",
        debug: "-g",
        build_dll: " -shared",
        build_lib: "tcc -ar -o $libfile $objfiles",
        props: CompilerDescriptor::props(&[CompilerProp::GnuAsm]),
        ..gcc_base()
    }
}

fn pcc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Pcc,
        name: "pcc",
        compiler_exe: "pcc",
        cpp_compiler: "pcc",
        linker_exe: "pcc",
        opt_speed: "-O2",
        opt_size: "-Os",
        props: CompilerDescriptor::props(&[CompilerProp::GnuAsm]),
        ..gcc_base()
    }
}

fn ucc() -> CompilerDescriptor {
    CompilerDescriptor {
        kind: CompilerKind::Ucc,
        name: "ucc",
        compiler_exe: "ucc",
        cpp_compiler: "",
        linker_exe: "ucc",
        opt_speed: "-O",
        opt_size: "-O",
        props: CompilerDescriptor::props(&[]),
        ..gcc_base()
    }
}

fn build_table() -> HashMap<CompilerKind, CompilerDescriptor> {
    let mut table = HashMap::new();
    for d in [
        gcc_base(),
        switch_gcc(),
        llvm_gcc(),
        clang(),
        lcc(),
        bcc(),
        dmc(),
        wcc(),
        vcc_base(),
        tcc(),
        pcc(),
        ucc(),
        icl(),
        icc(),
        clang_cl(),
    ] {
        table.insert(d.kind, d);
    }
    table
}

fn table() -> &'static HashMap<CompilerKind, CompilerDescriptor> {
    static TABLE: OnceLock<HashMap<CompilerKind, CompilerDescriptor>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Look up the descriptor for `kind`.
///
/// # Panics
///
/// Panics if `kind` is [`CompilerKind::None`] — looking up the sentinel
/// is a programming error, not a user error, per the data model
/// invariant.
pub fn descriptor_for(kind: CompilerKind) -> &'static CompilerDescriptor {
    table()
        .get(&kind)
        .expect("descriptor_for called with CompilerKind::None")
}

/// Style-insensitive match of `s` against every descriptor's `name`
/// field (ignoring underscores and letter case), returning
/// [`CompilerKind::None`] when nothing matches.
pub fn kind_from_name(s: &str) -> CompilerKind {
    let normalized = normalize_name(s);
    for kind in CompilerKind::ALL {
        if normalize_name(descriptor_for(*kind).name) == normalized {
            return *kind;
        }
    }
    CompilerKind::None
}

fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// True iff `kind` produces command lines compatible with MSVC's
/// `cl.exe`/`link.exe` conventions (`/flag` syntax, `/OUT:`, etc): `vcc`
/// and `clang_cl` always, `icl` only when the host is in the
/// Windows/DOS family.
pub fn is_vs_compatible(kind: CompilerKind, host_is_windows_family: bool) -> bool {
    match kind {
        CompilerKind::Vcc | CompilerKind::ClangCl => true,
        CompilerKind::Icl => host_is_windows_family,
        _ => false,
    }
}

/// The full defined-symbol set for conditional compilation: every
/// descriptor name is "undefined" except the active kind's, which is
/// "defined". Exposed as the list a caller should define; callers that
/// also want the undefine list can diff against [`CompilerKind::ALL`].
pub fn cdefs_for_active_kind(kind: CompilerKind) -> &'static str {
    descriptor_for(kind).name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn none_lookup_panics() {
        descriptor_for(CompilerKind::None);
    }

    #[test]
    fn descriptor_totality() {
        for kind in CompilerKind::ALL {
            let d = descriptor_for(*kind);
            assert!(!d.name.is_empty());
            assert!(!d.compile_tmpl.is_empty());
        }
    }

    #[test]
    fn name_round_trip() {
        for kind in CompilerKind::ALL {
            let d = descriptor_for(*kind);
            assert_eq!(kind_from_name(d.name), *kind);
        }
    }

    #[test]
    fn name_round_trip_is_style_insensitive() {
        assert_eq!(kind_from_name("Clang_CL"), CompilerKind::ClangCl);
        assert_eq!(kind_from_name("clangcl"), CompilerKind::ClangCl);
        assert_eq!(kind_from_name("CLANGCL"), CompilerKind::ClangCl);
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(kind_from_name("not-a-real-compiler"), CompilerKind::None);
    }

    #[test]
    fn vs_compatible_kinds() {
        assert!(is_vs_compatible(CompilerKind::Vcc, false));
        assert!(is_vs_compatible(CompilerKind::ClangCl, false));
        assert!(is_vs_compatible(CompilerKind::Icl, true));
        assert!(!is_vs_compatible(CompilerKind::Icl, false));
        assert!(!is_vs_compatible(CompilerKind::Gcc, true));
    }

    #[test]
    fn derived_descriptors_inherit_and_override() {
        let gcc = descriptor_for(CompilerKind::Gcc);
        let clang = descriptor_for(CompilerKind::Clang);
        assert_eq!(clang.compiler_exe, "clang");
        assert_eq!(clang.obj_ext, gcc.obj_ext);
        assert_eq!(clang.opt_speed, gcc.opt_speed);
    }
}
