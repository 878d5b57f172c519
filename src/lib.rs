//! ccdriver - external C/C++ toolchain driver.
//!
//! Given a set of already-generated C/C++/Objective-C source files, this
//! crate decides how to invoke a chosen third-party compiler and linker,
//! orchestrates those invocations (possibly in parallel), detects
//! incremental rebuild opportunities via content hashing, and emits
//! reproducible build artifacts (JSON build plans, shell scripts, mapping
//! files).
//!
//! It is not a build system: there is no dependency graph across user
//! units, no project manifest parsing, and no C parsing. Those are the
//! responsibility of a front end that assembles a [`config::Config`] and
//! a list of [`config::CFile`] entries and hands them to this driver.

pub mod command;
pub mod config;
pub mod descriptor;
pub mod diagnostic;
pub mod error;
pub mod executor;
pub mod footprint;
pub mod hash;
pub mod mapping;
pub mod options;
pub mod plan;
pub mod process;
pub mod shell;
pub mod template;

pub use config::{CFile, CFileFlags, Config};
pub use descriptor::{descriptor_for, kind_from_name, is_vs_compatible, CompilerDescriptor, CompilerKind};
pub use error::DriverError;
