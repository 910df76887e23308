//! formsynth command-line front end.

pub mod commands;
pub mod config;

pub use commands::{DocumentPaths, SubmitTally};
pub use config::{resolve_rules_path, resolve_schema_path};
