//! Configuration Management
//!
//! Hierarchical resolution, lowest priority first:
//! 1. Built-in defaults
//! 2. Global config (<config dir>/dddwiki/config.toml)
//! 3. Project config (.dddwiki/config.toml)
//! 4. Explicit `--config` file
//! 5. Environment variables (DDDWIKI_*)
//! 6. CLI arguments (highest priority)
//!
//! The resolved `Config` is built once at startup and passed by value into
//! the scanner, the orchestrator and the transport.

mod loader;
mod types;

pub use loader::{ConfigLoader, ENV_PREFIX};
pub use types::*;
