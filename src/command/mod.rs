//! Command synthesis (component D): turns a [`crate::config::Config`] and
//! a [`crate::config::CFile`] into concrete compile and link command
//! strings, by combining a [`crate::descriptor::CompilerDescriptor`]
//! with [`crate::options::per_file_options`] and
//! [`crate::template::expand_strict`].

pub mod compile;
pub mod link;

pub use compile::{compile_cmd, object_path, vccplatform};
pub use link::{finalize_hcr_main, hcr_link_commands, link_cmd, HcrLinkStep};
