//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (<config dir>/dddwiki/config.toml)
//! 3. Project config (.dddwiki/config.toml)
//! 4. Explicit `--config` file
//! 5. Environment variables (DDDWIKI_<SECTION>__<KEY>)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, WikiError};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "DDDWIKI_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → global → project → explicit file → env vars
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let config: Config = Self::figment(explicit)?
            .extract()
            .map_err(|e| WikiError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Build the merged figment without extracting it
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(WikiError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        // DDDWIKI_GENERATION__MAX_CONCURRENCY -> generation.max_concurrency
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        Ok(figment)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| WikiError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (e.g. ~/.config/dddwiki/)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dddwiki").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".dddwiki")
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Render the effective configuration
    pub fn render(config: &Config, format: &str) -> Result<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(config)?),
            "yaml" => Ok(serde_yaml::to_string(config)?),
            _ => Ok(toml::to_string_pretty(config)?),
        }
    }

    /// Write a default config file; existing files are kept unless `force`
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let path = if global {
            Self::global_config_path().ok_or_else(|| {
                WikiError::Config("Cannot determine global config directory".to_string())
            })?
        } else {
            Self::project_config_path()
        };

        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(path);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, Self::default_config_file())?;
        info!("Created config: {}", path.display());
        Ok(path)
    }

    fn default_config_file() -> String {
        r#"# dddwiki configuration
# Environment overrides use DDDWIKI_<SECTION>__<KEY>, e.g. DDDWIKI_LLM__MODEL.

version = "1.0"

[paths]
repo = "."
output = "Docs"
# templates = "templates"

[generation]
max_concurrency = 3
layer_timeout_secs = 960

[retry]
max_attempts = 5
multiplier = 1.0
max_wait_per_attempt_secs = 60
max_total_wait_secs = 300

[llm]
provider = "openai"
model = "gpt-4o-mini"
# base_url = "http://localhost:11434/v1"
timeout_secs = 180
temperature = 0.0
max_tokens = 8192
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file_merges_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[generation]\nmax_concurrency = 7\n\n[scanner]\ndomain_root = \"Src\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.generation.max_concurrency, 7);
        assert_eq!(config.scanner.domain_root, "Src");
        // untouched sections keep defaults
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.snippets.max_files, 10);
    }

    #[test]
    fn test_load_from_file_validates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[generation]\nmax_concurrency = 0\n").unwrap();

        assert!(matches!(
            ConfigLoader::load_from_file(&path),
            Err(WikiError::Config(_))
        ));
    }

    #[test]
    fn test_default_config_file_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, ConfigLoader::default_config_file()).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.layer_timeout(), Duration::from_secs(960));
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DDDWIKI_LLM__MODEL", "test-model");
            jail.set_env("DDDWIKI_GENERATION__MAX_CONCURRENCY", "5");
            let config = ConfigLoader::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.llm.model, "test-model");
            assert_eq!(config.generation.max_concurrency, 5);
            Ok(())
        });
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        assert!(
            ConfigLoader::render(&config, "toml")
                .unwrap()
                .contains("[generation]")
        );
        assert!(
            ConfigLoader::render(&config, "json")
                .unwrap()
                .contains("\"max_concurrency\"")
        );
        assert!(
            ConfigLoader::render(&config, "yaml")
                .unwrap()
                .contains("max_concurrency")
        );
    }
}
