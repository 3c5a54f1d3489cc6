//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `STAGEHAND_`-prefixed environment variables
//! 3. Config file (`--config`, or the default location if it exists)
//! 4. Built-in defaults (always present)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default values for runs.
    pub run: RunConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Default feature pack directory when `--pack` is omitted from config.
    pub pack: Option<PathBuf>,
    /// Continue past failed features by default.
    pub continue_on_error: bool,
    /// Per-script timeout in seconds.
    pub script_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            run: RunConfig {
                pack: None,
                continue_on_error: false,
                script_timeout_secs: 300,
            },
            output: OutputConfig {
                no_color: false,
                format: "human".into(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration, starting from defaults.
    ///
    /// `config_file` is the path the user passed via `--config`; when it is
    /// `None` the default location is used only if a file actually exists
    /// there. Environment variables use `__` as the section separator, e.g.
    /// `STAGEHAND_RUN__SCRIPT_TIMEOUT_SECS=600`.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("run.continue_on_error", defaults.run.continue_on_error)?
            .set_default(
                "run.script_timeout_secs",
                defaults.run.script_timeout_secs as i64,
            )?
            .set_default("output.no_color", defaults.output.no_color)?
            .set_default("output.format", defaults.output.format.as_str())?;

        match config_file {
            Some(path) => {
                builder = builder.add_source(config::File::from(path.clone()));
            }
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    builder = builder.add_source(config::File::from(default_path));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("STAGEHAND").separator("__"),
        );

        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.stagehand.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "stagehand", "stagehand")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".stagehand.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_fast() {
        let cfg = AppConfig::default();
        assert!(!cfg.run.continue_on_error);
        assert_eq!(cfg.run.script_timeout_secs, 300);
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[run]\ncontinue_on_error = true\nscript_timeout_secs = 42\n",
        )
        .unwrap();
        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert!(cfg.run.continue_on_error);
        assert_eq!(cfg.run.script_timeout_secs, 42);
        // Unset sections keep their defaults.
        assert_eq!(cfg.output.format, "human");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = PathBuf::from("/no/such/config.toml");
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn config_path_is_non_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
    }
}
