//! `ccdriver build` - assemble a `Config`, run the footprint oracle,
//! compile, link, and optionally emit plan/mapping artifacts.

use std::fs;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use ccdriver::command::{compile_cmd, finalize_hcr_main, hcr_link_commands, link_cmd, object_path};
use ccdriver::config::{CFile, CommandMode, Config};
use ccdriver::error::{DriverError, Result};
use ccdriver::executor::{self, Job};
use ccdriver::mapping::{self, Mapping};
use ccdriver::plan::{self, BuildPlan};
use ccdriver::{descriptor, footprint};

use crate::cli::{BuildArgs, MessageFormat};

/// JSON-serializable summary printed in `--message-format json` mode.
#[derive(Debug, Serialize)]
struct BuildReport {
    compiled: usize,
    cached: usize,
    linked: bool,
    elapsed_ms: u128,
    plan_path: Option<String>,
    mapping_path: Option<String>,
}

pub fn execute(args: BuildArgs, verbosity: u8, jobs: usize) -> Result<()> {
    let started = Instant::now();
    let mut cfg = build_config(&args)?;

    fs::create_dir_all(&cfg.nimcache_dir).map_err(|e| DriverError::WriteFailed {
        path: cfg.nimcache_dir.clone(),
        source: e,
    })?;

    let mut compiled = 0usize;
    let mut cached = 0usize;
    let mut compile_jobs = Vec::new();
    let mut compile_entries = Vec::new();

    for (index, cfile) in cfg.to_compile.clone().into_iter().enumerate() {
        let mut cfile = cfile;
        // The first source named on the command line is the designated
        // HCR main object; it links to an executable while every other
        // object becomes its own DLL (see `link::hcr_link_commands`).
        let is_main = index == 0;
        let cmd = compile_cmd(&cfg, &cfile, is_main, cfg.globals.produce_asm)?;
        let needs_build = footprint::check_and_update(&cfg, &mut cfile, &cmd)
            .map_err(|e| DriverError::WriteFailed {
                path: object_path(&cfg, &cfile),
                source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            })?;
        cfg.to_compile[index] = cfile.clone();

        if needs_build {
            compiled += 1;
            compile_entries.push((cfile.c_name.clone(), cmd.clone()));
            compile_jobs.push(Job {
                index,
                command: cmd,
                label: Some(cfile.c_name.display().to_string()),
            });
        } else {
            cached += 1;
        }
    }

    info!(compiled, cached, "footprint check complete");

    let bar = if verbosity == 1 && args.message_format == MessageFormat::Human {
        let bar = indicatif::ProgressBar::new(compile_jobs.len() as u64);
        bar.set_style(
            indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    let results = executor::run_all(compile_jobs, jobs, verbosity, args.message_format == MessageFormat::Json, |job| {
        if let Some(bar) = &bar {
            bar.inc(1);
            if let Some(label) = &job.label {
                bar.set_message(label.clone());
            }
        }
    })?;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    if let Some(err) = executor::first_failure(&results) {
        return Err(err);
    }

    let mut linked = false;
    let mut linkcmd = String::new();
    if !cfg.globals.no_linking && !cfg.globals.compile_only {
        let objfiles = cfg.link_object_order();

        if cfg.hcr_on {
            let main_obj = cfg
                .to_compile
                .first()
                .map(|cfile| object_path(&cfg, cfile))
                .unwrap_or_default();
            let steps = hcr_link_commands(&cfg, &objfiles, &main_obj, &cfg.out_file)?;
            let main_step = steps
                .iter()
                .find(|s| s.is_main)
                .map(|s| s.produced.clone());

            let hcr_jobs: Vec<Job> = steps
                .iter()
                .enumerate()
                .map(|(i, step)| Job { index: i, command: step.command.clone(), label: None })
                .collect();
            let hcr_results = executor::run_all(hcr_jobs, jobs, verbosity, false, |_| {})?;
            if let Some(err) = executor::first_failure(&hcr_results) {
                return Err(err);
            }

            if let Some(main_built) = main_step {
                finalize_hcr_main(&main_built, &cfg.out_file)?;
            }
        } else {
            let is_dll = cfg.globals.gen_dyn_lib;
            linkcmd = link_cmd(&cfg, &cfg.out_file, &objfiles, is_dll)?;
            let link_job = Job { index: 0, command: linkcmd.clone(), label: None };
            let link_results = executor::run_all(vec![link_job], 1, verbosity, false, |_| {})?;
            if let Some(err) = executor::first_failure(&link_results) {
                return Err(err);
            }
        }
        linked = true;
    }

    let mut plan_path = None;
    if args.write_plan {
        let path = cfg.nimcache_dir.join(format!("{}.json", cfg.project_name));
        let plan = BuildPlan {
            compile: compile_entries,
            link: cfg.link_object_order(),
            linkcmd: linkcmd.clone(),
            cmdline: None,
            depfiles: None,
            nimexe: None,
        };
        plan::write_plan(&path, &plan)?;
        plan_path = Some(path.display().to_string());
    }

    let mut mapping_path = None;
    if cfg.globals.gen_mapping {
        let path = cfg.project_path.join("mapping.txt");
        let mapping = Mapping {
            c_files: cfg.to_compile.iter().map(|c| c.c_name.display().to_string()).collect(),
            compiler_flags: cfg.compile_options.clone(),
            linker_flags: cfg.link_options.clone(),
            library_path: cfg.lib_path.display().to_string(),
            environment: Vec::new(),
            symbols: String::new(),
        };
        mapping::write_mapping(&path, &mapping)?;
        mapping_path = Some(path.display().to_string());
    }

    let report = BuildReport {
        compiled,
        cached,
        linked,
        elapsed_ms: started.elapsed().as_millis(),
        plan_path,
        mapping_path,
    };

    match args.message_format {
        MessageFormat::Json => {
            println!("{}", serde_json::to_string(&report).unwrap_or_default());
        }
        MessageFormat::Human => {
            println!(
                "compiled {} file(s), {} cached{}",
                report.compiled,
                report.cached,
                if report.linked { ", linked" } else { "" }
            );
        }
    }

    Ok(())
}

fn build_config(args: &BuildArgs) -> Result<Config> {
    let mut cfg = Config::new(args.project_name.clone());

    if let Some(name) = &args.compiler {
        cfg.set_compiler(name)?;
    } else if let Ok(cc) = std::env::var("CC") {
        let kind = descriptor::kind_from_name(&cc);
        if kind != descriptor::CompilerKind::None {
            cfg.compiler = kind;
        }
    }

    cfg.out_file = args.out.clone();
    cfg.nimcache_dir = args.nimcache.clone();
    cfg.project_path = args.out.parent().map(Into::into).unwrap_or_default();
    cfg.optimize_speed = args.optimize_speed;
    cfg.optimize_size = args.optimize_size;
    cfg.globals.c_debug = args.debug;
    cfg.globals.gen_gui_app = args.gui;
    cfg.globals.gen_dyn_lib = args.dll;
    cfg.globals.gen_static_lib = args.static_lib;
    cfg.hcr_on = args.hcr;
    cfg.globals.no_linking = args.no_linking;
    cfg.globals.compile_only = args.compile_only;
    cfg.globals.gen_script = args.gen_script;
    cfg.globals.gen_mapping = args.gen_mapping;
    cfg.c_includes = args.include.clone();
    cfg.c_linked_libs = args.libs.clone();
    cfg.command_mode = CommandMode::CompileToC;

    let mut sources = args.sources.clone();
    if let Some(list_path) = &args.sources_file {
        let text = fs::read_to_string(list_path).map_err(|e| DriverError::WriteFailed {
            path: list_path.clone(),
            source: e,
        })?;
        sources.extend(text.lines().filter(|l| !l.trim().is_empty()).map(Into::into));
    }

    for source in sources {
        let nim_name = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut cfile = CFile::new(nim_name, source);
        cfile.flags.external = true;
        cfg.to_compile.push(cfile);
    }

    Ok(cfg)
}
