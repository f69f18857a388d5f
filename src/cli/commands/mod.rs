//! Subcommand entry points called from `main`.

pub mod config;
pub mod generate;
pub mod scan;
