//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. TOML file: the `--config` path, else `config.toml` in the platform
//!    config directory (missing default file is fine)
//! 3. Environment variables prefixed `DFF_` (e.g. `DFF_HASH_ALGORITHM=sha256`)
//! 4. Command-line flags ([`Settings::apply_cli`])
//!
//! # Example file
//!
//! ```toml
//! prefix_bytes = 8192
//! hash_algorithm = "blake3"
//! skip_hidden = true
//! exclude = ["target/", "*.tmp"]
//! io_concurrency = 2
//! output = "list"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};
use crate::duplicates::{default_cpu_concurrency, FinderConfig, DEFAULT_IO_CONCURRENCY};
use crate::scanner::{CollectorConfig, DigestAlgorithm, DEFAULT_PREFIX_BYTES};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DFF_";

/// Invalid combinations of settings.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The prefix stage needs at least one byte.
    #[error("prefix_bytes must be at least 1")]
    ZeroPrefix,

    /// A pool or limiter would have no capacity.
    #[error("{0} must be at least 1")]
    ZeroConcurrency(&'static str),

    /// The size filter can never match.
    #[error("min_size ({min}) is larger than max_size ({max})")]
    InvertedSizeRange {
        /// Lower bound in bytes
        min: u64,
        /// Upper bound in bytes
        max: u64,
    },
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bytes hashed in the prefix stage.
    pub prefix_bytes: u64,
    /// Digest algorithm.
    pub hash_algorithm: DigestAlgorithm,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Gitignore-style exclude patterns.
    pub exclude: Vec<String>,
    /// Smallest file size considered.
    pub min_size: Option<u64>,
    /// Largest file size considered.
    pub max_size: Option<u64>,
    /// Simultaneously open readers.
    pub io_concurrency: usize,
    /// Hashing threads; available parallelism when unset.
    pub cpu_concurrency: Option<usize>,
    /// Report format.
    pub output: OutputFormat,
    /// Exit with code 2 when duplicates exist.
    pub fail_on_duplicate: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix_bytes: DEFAULT_PREFIX_BYTES,
            hash_algorithm: DigestAlgorithm::default(),
            follow_symlinks: false,
            skip_hidden: false,
            exclude: Vec::new(),
            min_size: None,
            max_size: None,
            io_concurrency: DEFAULT_IO_CONCURRENCY,
            cpu_concurrency: None,
            output: OutputFormat::default(),
            fail_on_duplicate: false,
        }
    }
}

impl Settings {
    /// Build the figment for the file and environment layers.
    ///
    /// An explicit `config_path` must exist; the default location is optional.
    pub fn figment(config_path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match config_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = default_config_path() {
                    log::debug!("Looking for config at {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load defaults, file and environment layers.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let settings: Self = Self::figment(config_path)?
            .extract()
            .context("Failed to load configuration")?;
        Ok(settings)
    }

    /// Overlay the flags that were given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(bytes) = cli.prefix_bytes {
            self.prefix_bytes = bytes;
        }
        if let Some(algorithm) = cli.algorithm {
            self.hash_algorithm = algorithm;
        }
        if cli.follow_symlinks {
            self.follow_symlinks = true;
        }
        if cli.skip_hidden {
            self.skip_hidden = true;
        }
        if !cli.exclude.is_empty() {
            self.exclude.extend(cli.exclude.iter().cloned());
        }
        if cli.min_size.is_some() {
            self.min_size = cli.min_size;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        if let Some(readers) = cli.io_threads {
            self.io_concurrency = readers;
        }
        if cli.cpu_threads.is_some() {
            self.cpu_concurrency = cli.cpu_threads;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if cli.fail_on_duplicate {
            self.fail_on_duplicate = true;
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix_bytes == 0 {
            return Err(ConfigError::ZeroPrefix);
        }
        if self.io_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency("io_concurrency"));
        }
        if self.cpu_concurrency == Some(0) {
            return Err(ConfigError::ZeroConcurrency("cpu_concurrency"));
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(ConfigError::InvertedSizeRange { min, max });
            }
        }
        Ok(())
    }

    /// Collector filters described by these settings.
    #[must_use]
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig::default()
            .with_follow_symlinks(self.follow_symlinks)
            .with_skip_hidden(self.skip_hidden)
            .with_size_range(self.min_size, self.max_size)
            .with_exclude_patterns(self.exclude.clone())
    }

    /// Finder configuration without shutdown flag or progress callback.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_prefix_bytes(self.prefix_bytes)
            .with_algorithm(self.hash_algorithm)
            .with_io_concurrency(self.io_concurrency)
            .with_cpu_concurrency(self.cpu_concurrency.unwrap_or_else(default_cpu_concurrency))
            .with_collector_config(self.collector_config())
    }
}

/// Default platform-specific config file location.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dff").map(|dirs| dirs.config_dir().join("config.toml"))
}
