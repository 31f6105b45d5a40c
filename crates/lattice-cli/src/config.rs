// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for the lattice CLI.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use lattice_core::AssignConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Key the CLI settings are stored under.
pub const CLI_CONFIG_KEY: &str = "lattice";

/// Where settings documents live. Keys are logical names such as
/// [`CLI_CONFIG_KEY`]; values are JSON bytes.
pub trait ConfigStore {
    /// Reads the document stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces the document stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure to read or write CLI settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key yet.
    #[error("settings not found")]
    NotFound,
    /// The platform has no per-user config directory (no home directory).
    #[error("no config directory for lattice; pass --config-dir")]
    NoConfigDir,
    /// Reading or writing the settings file failed.
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),
    /// The stored settings are not valid JSON for [`CliConfig`].
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads and saves typed settings as JSON through a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Reads the value under `key`; a missing or empty document is `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Err(ConfigError::NotFound) => return Ok(None),
            other => other?,
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Writes `value` under `key` as pretty-printed JSON.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        self.store.save_raw(key, &serde_json::to_vec_pretty(value)?)
    }
}

/// Persistent CLI settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Moniker assignment tunables.
    pub assign: AssignConfig,
    /// Package name used when `--package` is not given.
    pub package: Option<String>,
}

/// Store configs as JSON files under a directory (the platform config dir by default).
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Create a store rooted at the user config directory (e.g., `~/.config/lattice`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj =
            ProjectDirs::from("dev", "flyingrobots", "lattice").ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::at(proj.config_dir()))
    }

    /// Create a store rooted at `base`.
    pub fn at(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.path_for(key);
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        blobs: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemoryStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.blobs
                .borrow()
                .get(key)
                .cloned()
                .ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn missing_key_loads_as_none() {
        let svc = ConfigService::new(MemoryStore::default());
        assert_eq!(svc.load::<CliConfig>(CLI_CONFIG_KEY).unwrap(), None);
    }

    #[test]
    fn saved_config_loads_back() {
        let svc = ConfigService::new(MemoryStore::default());
        let cfg = CliConfig {
            assign: AssignConfig::default().with_traversal_budget(42),
            package: Some("web".into()),
        };
        svc.save(CLI_CONFIG_KEY, &cfg).unwrap();
        assert_eq!(svc.load::<CliConfig>(CLI_CONFIG_KEY).unwrap(), Some(cfg));
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let store = MemoryStore::default();
        store.save_raw(CLI_CONFIG_KEY, br#"{"package":"api"}"#).unwrap();
        let cfg: CliConfig = ConfigService::new(store).load(CLI_CONFIG_KEY).unwrap().unwrap();
        assert_eq!(cfg.package.as_deref(), Some("api"));
        assert_eq!(cfg.assign, AssignConfig::default());
    }

    #[test]
    fn corrupt_settings_surface_as_json_errors() {
        let store = MemoryStore::default();
        store.save_raw(CLI_CONFIG_KEY, b"{not json").unwrap();
        let err = ConfigService::new(store)
            .load::<CliConfig>(CLI_CONFIG_KEY)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn fs_store_round_trips_through_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().join("nested"));
        assert!(matches!(store.load_raw("k"), Err(ConfigError::NotFound)));
        store.save_raw("k", b"{}").unwrap();
        assert_eq!(store.load_raw("k").unwrap(), b"{}");
    }
}
