//! INI-shaped mapping writer for external tooling (component I).

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{DriverError, Result};

/// Everything needed to render `mapping.txt`. Flag strings and the
/// symbol blob are opaque to this module — they're produced elsewhere
/// and just get escaped and written out here.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    pub c_files: Vec<String>,
    pub compiler_flags: String,
    pub linker_flags: String,
    pub library_path: String,
    pub environment: Vec<(String, String)>,
    pub symbols: String,
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render `mapping` as the INI document described in the module docs
/// and write it to `path`.
pub fn write_mapping(path: &Path, mapping: &Mapping) -> Result<()> {
    let mut out = String::new();

    out.push_str("[C_Files]\n");
    for file in &mapping.c_files {
        let _ = writeln!(out, "--file:r\"{}\"", escape(file));
    }

    out.push_str("\n[C_Compiler]\n");
    let _ = writeln!(out, "flags={}", escape(&mapping.compiler_flags));

    out.push_str("\n[Linker]\n");
    let _ = writeln!(out, "flags={}", escape(&mapping.linker_flags));
    let _ = writeln!(out, "libpath={}", escape(&mapping.library_path));

    out.push_str("\n[Environment]\n");
    for (key, value) in &mapping.environment {
        let _ = writeln!(out, "{key}={}", escape(value));
    }

    out.push_str("\n[Symbols]\n");
    out.push_str(&mapping.symbols);
    out.push('\n');

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    fs::write(path, out).map_err(|e| DriverError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_every_section() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mapping.txt");
        let mapping = Mapping {
            c_files: vec!["/t/m.nim.c".into()],
            compiler_flags: "-O3".into(),
            linker_flags: "-lm".into(),
            library_path: "/opt/lib".into(),
            environment: vec![("CC".into(), "gcc".into())],
            symbols: "main=_main".into(),
        };
        write_mapping(&path, &mapping).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[C_Files]"));
        assert!(text.contains("--file:r\"/t/m.nim.c\""));
        assert!(text.contains("[C_Compiler]"));
        assert!(text.contains("[Linker]"));
        assert!(text.contains("[Environment]"));
        assert!(text.contains("[Symbols]"));
        assert!(text.contains("main=_main"));
    }
}
