// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Persistent storage for [`ThrottleConfig`].
//!
//! A missing or malformed record is never fatal: [`ConfigStore::load_or_default`]
//! falls back to the compiled-in defaults and writes them back so the next
//! start finds a valid file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tickwarden_core::config::{ThrottleConfig, CONFIG_VERSION};

/// File name of the record inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// An error raised while reading or writing the configuration record.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or its directory could not be accessed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file exists but does not hold a valid record.
    #[error("malformed configuration in {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The record could not be encoded.
    #[error("failed to encode configuration: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A specialized `Result` type for configuration storage.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Backing storage for the configuration record.
pub trait ConfigStore: Send + Sync {
    /// Reads the stored record, or `None` if nothing is stored yet.
    fn load(&self) -> ConfigResult<Option<ThrottleConfig>>;

    /// Replaces the stored record.
    fn save(&self, config: &ThrottleConfig) -> ConfigResult<()>;

    /// Reads the stored record, substituting and persisting defaults when it
    /// is missing or unreadable, and upgrading it when its version differs.
    fn load_or_default(&self) -> ThrottleConfig {
        let (config, rewrite) = match self.load() {
            Ok(Some(config)) if config.version == CONFIG_VERSION => (config, false),
            Ok(Some(config)) => {
                log::info!(
                    "Upgrading configuration from version {} to {}.",
                    config.version,
                    CONFIG_VERSION
                );
                let upgraded = ThrottleConfig {
                    version: CONFIG_VERSION,
                    ..config
                };
                (upgraded, true)
            }
            Ok(None) => {
                log::info!("No configuration found, writing defaults.");
                (ThrottleConfig::default(), true)
            }
            Err(e) => {
                log::warn!("{e}. Falling back to default configuration.");
                (ThrottleConfig::default(), true)
            }
        };

        if rewrite {
            if let Err(e) = self.save(&config) {
                log::warn!("Could not persist configuration: {e}");
            }
        }
        config
    }
}

/// Stores the record as pretty-printed JSON in `<dir>/config.json`.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// Creates a store for the record inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    /// Full path of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> ConfigResult<Option<ThrottleConfig>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, config: &ThrottleConfig) -> ConfigResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(config).map_err(ConfigError::Encode)?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        log::debug!("Configuration saved to {}", self.path.display());
        Ok(())
    }
}
