//! Per-file compile-option assembly (component C).
//!
//! [`per_file_options`] is the one place that decides, for a single
//! source file, which flags end up on its compile line and in what
//! order. The order matters: later-stage flags (debug/speed/size, then
//! `.always`) are meant to be able to override earlier ones when a
//! given toolchain treats "last flag wins" as its own convention.

use crate::config::Config;
use crate::descriptor::CompilerDescriptor;

/// Assemble the options string for `full_path` (the module named
/// `nim_name`), per the ordered concatenation described in the module
/// docs.
///
/// `is_main` identifies the HCR main file: PIC is forced on for every
/// other object in an HCR build (they each become their own DLL) but
/// never for the main file itself, which links as a normal executable.
pub fn per_file_options(
    cfg: &Config,
    descriptor: &CompilerDescriptor,
    nim_name: &str,
    full_path: &str,
    is_main: bool,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !cfg.compile_options.is_empty() {
        parts.push(cfg.compile_options.clone());
    }

    if let Some(specific) = cfg.cfile_specific_options.get(std::path::Path::new(full_path)) {
        if !specific.is_empty() {
            parts.push(specific.clone());
        }
    }

    let mut result = parts.join(" ");
    for extra in &cfg.compile_options_cmd {
        if !result.contains(extra.as_str()) {
            if !result.is_empty() {
                result.push(' ');
            }
            result.push_str(extra);
        }
    }

    let mode_flag = if cfg.globals.c_debug {
        config_var_or(cfg, nim_name, "debug", descriptor.debug)
    } else if cfg.optimize_speed {
        config_var_or(cfg, nim_name, "speed", descriptor.opt_speed)
    } else if cfg.optimize_size {
        config_var_or(cfg, nim_name, "size", descriptor.opt_size)
    } else {
        String::new()
    };
    if !mode_flag.is_empty() {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(&mode_flag);
    }

    if let Some(always) = cfg.config_vars.get(&format!("{nim_name}.always")) {
        if !always.is_empty() {
            if !result.is_empty() {
                result.push(' ');
            }
            result.push_str(always);
        }
    }

    if wants_pic(cfg, is_main) && cfg.target_os.needs_pic() && !descriptor.pic.is_empty() {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(descriptor.pic);
    }

    result
}

fn wants_pic(cfg: &Config, is_main: bool) -> bool {
    cfg.globals.gen_dyn_lib || (cfg.hcr_on && !is_main)
}

fn config_var_or<'a>(cfg: &'a Config, nim_name: &str, suffix: &str, default: &'a str) -> String {
    cfg.config_vars
        .get(&format!("{nim_name}.{suffix}"))
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{descriptor_for, CompilerKind};

    fn base_config() -> Config {
        Config::new("proj")
    }

    #[test]
    fn base_and_cmd_options_concatenate() {
        let mut cfg = base_config();
        cfg.compile_options = "-Wall".into();
        cfg.add_compile_option("-Wextra");
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", false);
        assert_eq!(out, "-Wall -Wextra");
    }

    #[test]
    fn cmd_dedup_against_running_result() {
        let mut cfg = base_config();
        cfg.compile_options = "-Wall -Wextra".into();
        cfg.add_compile_option("-Wextra");
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", false);
        assert_eq!(out, "-Wall -Wextra");
    }

    #[test]
    fn speed_mode_appends_descriptor_default() {
        let mut cfg = base_config();
        cfg.optimize_speed = true;
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", false);
        assert_eq!(out, "-O3 -fno-ident");
    }

    #[test]
    fn per_module_override_wins_over_descriptor_default() {
        let mut cfg = base_config();
        cfg.optimize_speed = true;
        cfg.config_vars.insert("m.speed".into(), "-O1".into());
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", false);
        assert_eq!(out, "-O1");
    }

    #[test]
    fn pic_appended_for_dynamic_lib_on_pic_os() {
        let mut cfg = base_config();
        cfg.globals.gen_dyn_lib = true;
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", false);
        assert_eq!(out, "-fPIC");
    }

    #[test]
    fn pic_not_appended_on_windows() {
        let mut cfg = base_config();
        cfg.globals.gen_dyn_lib = true;
        cfg.target_os = crate::config::Os::Windows;
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", false);
        assert_eq!(out, "");
    }

    #[test]
    fn pic_appended_for_hcr_non_main_file() {
        let mut cfg = base_config();
        cfg.hcr_on = true;
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", false);
        assert_eq!(out, "-fPIC");
    }

    #[test]
    fn pic_not_appended_for_hcr_main_file() {
        let mut cfg = base_config();
        cfg.hcr_on = true;
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", true);
        assert_eq!(out, "");
    }

    #[test]
    fn always_var_appended_last() {
        let mut cfg = base_config();
        cfg.optimize_speed = true;
        cfg.config_vars.insert("m.always".into(), "-DFOO".into());
        let d = descriptor_for(CompilerKind::Gcc);
        let out = per_file_options(&cfg, d, "m", "/t/m.c", false);
        assert_eq!(out, "-O3 -fno-ident -DFOO");
    }
}
