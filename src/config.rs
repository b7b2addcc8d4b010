//! Application configuration management.
//!
//! Settings are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the platform config directory, or an explicit file
//! 3. `DRYDUPE_*` environment variables
//! 4. command-line flags ([`Config::apply_cli`])
//!
//! The report location is part of the configuration: callers ask
//! [`Config::output_path`] instead of deriving paths on their own.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::output::OutputFormat;
use crate::scanner::WalkerConfig;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    /// A configuration source could not be parsed.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory reports are written to; `None` streams text and JSON to stdout.
    pub output_dir: Option<PathBuf>,
    /// Report file name without extension.
    pub report_name: String,
    /// Report format name, parsed with [`OutputFormat::parse`].
    pub format: String,
    /// Record store location; `None` uses a temporary file.
    pub database: Option<PathBuf>,
    pub follow_symlinks: bool,
    pub skip_hidden: bool,
    pub min_size: Option<u64>,
    /// Number of hashing threads.
    pub io_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            report_name: "duplicates".to_string(),
            format: OutputFormat::Stdout.to_string(),
            database: None,
            follow_symlinks: false,
            skip_hidden: false,
            min_size: None,
            io_threads: 4,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// `explicit` overrides the platform config path and must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or any source
    /// fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path(),
        };
        let config: Self = Self::figment(file.as_deref())
            .merge(Env::prefixed("DRYDUPE_"))
            .extract()?;
        log::debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Load defaults and the given file only, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the file fails to parse.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::figment(Some(path)).extract()?)
    }

    fn figment(file: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match file {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    /// Default platform-specific configuration file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "drydupe", "drydupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Overlay flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.output_dir {
            self.output_dir = Some(dir.clone());
        }
        if let Some(name) = &cli.name {
            self.report_name = name.clone();
        }
        if let Some(format) = &cli.format {
            self.format = format.clone();
        }
        if let Some(database) = &cli.database {
            self.database = Some(database.clone());
        }
        if let Some(min_size) = cli.min_size {
            self.min_size = Some(min_size);
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        self.follow_symlinks |= cli.follow_symlinks;
        self.skip_hidden |= cli.skip_hidden;
    }

    /// The configured report format; unknown names give `Invalid`.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::parse(&self.format)
    }

    /// Where the report for `format` is written.
    #[must_use]
    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        let dir = self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        dir.join(format!("{}{}", self.report_name, format.extension()))
    }

    /// Whether `format` goes to stdout instead of a file.
    #[must_use]
    pub fn writes_to_terminal(&self, format: OutputFormat) -> bool {
        self.output_dir.is_none() && matches!(format, OutputFormat::Stdout | OutputFormat::Json)
    }

    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            follow_symlinks: self.follow_symlinks,
            skip_hidden: self.skip_hidden,
            min_size: self.min_size,
        }
    }
}
