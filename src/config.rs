//! Signer configuration - built by the binary (flags over env) or by tests.

use crate::clock::{ClockConfig, DEFAULT_INTERVAL_MS};
use crate::core::paths;
use crate::error::{SignerError, SignerResult};
use crate::keys::{DEFAULT_CANDIDATE_LIMIT, WORD_COUNTS};
use crate::storage::{FileMedium, MemoryMedium, StorageMedium};
use crate::wallet::Network;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the storage medium lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// Files under a directory.
    Dir(PathBuf),
    /// Nothing survives the process.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
    pub storage: StorageMode,
    /// Logical path of the reckless record on the medium.
    pub reckless_path: String,
    /// Network selected when a seed is first loaded.
    pub network: Network,
    pub tick_ms: u64,
    pub word_count: usize,
    pub candidate_limit: usize,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            storage: StorageMode::Memory,
            reckless_path: paths::RECKLESS.into(),
            network: Network::Testnet,
            tick_ms: DEFAULT_INTERVAL_MS,
            word_count: 12,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

impl SignerConfig {
    pub fn new() -> Self { Self::default() }

    /// Filesystem storage under the default data directory.
    #[cfg(feature = "native")]
    pub fn native() -> Self {
        Self { storage: StorageMode::Dir(default_data_dir()), ..Self::default() }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self { self.storage = StorageMode::Dir(dir.into()); self }
    pub fn with_memory_storage(mut self) -> Self { self.storage = StorageMode::Memory; self }
    pub fn with_reckless_path(mut self, path: impl Into<String>) -> Self { self.reckless_path = path.into(); self }
    pub fn with_network(mut self, network: Network) -> Self { self.network = network; self }
    pub fn with_tick_ms(mut self, ms: u64) -> Self { self.tick_ms = ms; self }
    pub fn with_word_count(mut self, words: usize) -> Self { self.word_count = words; self }
    pub fn with_candidate_limit(mut self, limit: usize) -> Self { self.candidate_limit = limit; self }

    /// Layers `BEESIGNER_*` variables over the current values.
    pub fn apply_env(mut self) -> SignerResult<Self> {
        if let Ok(root) = std::env::var(paths::env::ROOT) {
            if !root.trim().is_empty() {
                self.storage = StorageMode::Dir(PathBuf::from(root));
            }
        }
        if let Ok(id) = std::env::var(paths::env::NETWORK) {
            self.network = Network::from_id(id.trim())?;
        }
        if let Ok(ms) = std::env::var(paths::env::TICK_MS) {
            self.tick_ms = ms
                .trim()
                .parse()
                .map_err(|_| SignerError::Configuration(format!("{}: not a number: {ms}", paths::env::TICK_MS)))?;
        }
        if let Ok(words) = std::env::var(paths::env::WORDS) {
            self.word_count = words
                .trim()
                .parse()
                .map_err(|_| SignerError::Configuration(format!("{}: not a number: {words}", paths::env::WORDS)))?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> SignerResult<()> {
        if !WORD_COUNTS.contains(&self.word_count) {
            return Err(SignerError::Configuration(format!("unsupported word count: {}", self.word_count)));
        }
        if self.tick_ms == 0 {
            return Err(SignerError::Configuration("tick interval must be positive".into()));
        }
        if self.reckless_path.trim().is_empty() {
            return Err(SignerError::Configuration("empty reckless path".into()));
        }
        Ok(())
    }

    pub fn clock(&self) -> ClockConfig {
        ClockConfig::new().with_interval_ms(self.tick_ms)
    }

    pub fn open_medium(&self) -> Arc<dyn StorageMedium> {
        match &self.storage {
            StorageMode::Dir(root) => Arc::new(FileMedium::new(root.clone())),
            StorageMode::Memory => Arc::new(MemoryMedium::new()),
        }
    }
}

/// `$BEESIGNER_ROOT`, else `<data_local_dir>/beesigner`.
#[cfg(feature = "native")]
pub fn default_data_dir() -> PathBuf {
    std::env::var(paths::env::ROOT)
        .ok()
        .filter(|root| !root.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("beesigner")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_env() {
        for var in [paths::env::ROOT, paths::env::NETWORK, paths::env::TICK_MS, paths::env::WORDS] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = SignerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.tick_ms, 30);
        assert_eq!(config.reckless_path, "reckless.json");
    }

    #[test]
    fn builder_sets_fields() {
        let config = SignerConfig::new()
            .with_data_dir("/tmp/signer")
            .with_network(Network::Signet)
            .with_tick_ms(50)
            .with_word_count(24)
            .with_candidate_limit(4);
        assert_eq!(config.storage, StorageMode::Dir("/tmp/signer".into()));
        assert_eq!(config.clock().interval_ms, 50);
        assert_eq!(config.word_count, 24);
        config.validate().unwrap();
        assert!(config.with_word_count(13).validate().is_err());
    }

    #[test]
    fn env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(paths::env::ROOT, "/tmp/beesigner-env");
        std::env::set_var(paths::env::NETWORK, "regtest");
        std::env::set_var(paths::env::TICK_MS, "15");
        std::env::set_var(paths::env::WORDS, "24");

        let config = SignerConfig::new().apply_env().unwrap();
        assert_eq!(config.storage, StorageMode::Dir("/tmp/beesigner-env".into()));
        assert_eq!(config.network, Network::Regtest);
        assert_eq!(config.tick_ms, 15);
        assert_eq!(config.word_count, 24);
        clear_env();
    }

    #[test]
    fn bad_env_network_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(paths::env::NETWORK, "moon");
        let err = SignerConfig::new().apply_env().unwrap_err();
        assert!(err.is_fatal());
        clear_env();
    }
}
