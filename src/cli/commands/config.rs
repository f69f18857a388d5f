//! Config Command
//!
//! Usage:
//!   dddwiki config show [-f text|json|yaml]
//!   dddwiki config path
//!   dddwiki config init [-g] [--force]

use crate::cli::Output;
use crate::config::{Config, ConfigLoader, ENV_PREFIX};
use crate::types::Result;

/// Print the effective configuration merged from every source
pub fn show(config: &Config, format: &str) -> Result<()> {
    println!("{}", ConfigLoader::render(config, format)?);
    Ok(())
}

/// Print where configuration is read from
pub fn path(out: &Output) -> Result<()> {
    out.section("Configuration sources");
    match ConfigLoader::global_config_path() {
        Some(global) => out.field("Global", describe(&global)),
        None => out.field("Global", "unavailable"),
    }
    out.field("Project", describe(&ConfigLoader::project_config_path()));
    out.field("Environment", format!("{ENV_PREFIX}<SECTION>__<KEY>"));
    Ok(())
}

pub fn init(global: bool, force: bool, out: &Output) -> Result<()> {
    let path = ConfigLoader::init(global, force)?;
    let scope = if global { "global" } else { "project" };
    out.success(&format!("Initialized {scope} configuration"));
    out.field("Config", path.display());
    Ok(())
}

fn describe(path: &std::path::Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}
