//! `ccdriver doctor` - report which compiler kind would be
//! auto-detected on this host and whether its executables resolve.

use ccdriver::descriptor::{self, CompilerKind};
use ccdriver::error::Result;

use crate::cli::DoctorArgs;

fn detect_default_kind() -> CompilerKind {
    for var in ["CC", "CXX"] {
        if let Ok(value) = std::env::var(var) {
            let kind = descriptor::kind_from_name(&value);
            if kind != CompilerKind::None {
                return kind;
            }
        }
    }
    if cfg!(target_os = "windows") {
        CompilerKind::Vcc
    } else if cfg!(target_os = "macos") {
        CompilerKind::Clang
    } else {
        CompilerKind::Gcc
    }
}

fn check_one(kind: CompilerKind) {
    let d = descriptor::descriptor_for(kind);
    println!("{}:", d.name);
    for (label, exe) in [("compiler", d.compiler_exe), ("c++ compiler", d.cpp_compiler), ("linker", d.linker_exe)] {
        if exe.is_empty() {
            continue;
        }
        match which::which(exe) {
            Ok(path) => println!("  {label}: {exe} -> {}", path.display()),
            Err(_) => println!("  {label}: {exe} -> not found on PATH"),
        }
    }
}

pub fn execute(args: DoctorArgs) -> Result<()> {
    let detected = detect_default_kind();
    println!("detected compiler kind: {}", descriptor::descriptor_for(detected).name);
    check_one(detected);

    if args.all {
        println!();
        for kind in CompilerKind::ALL {
            if *kind != detected {
                check_one(*kind);
            }
        }
    }

    Ok(())
}
