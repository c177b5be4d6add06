//! Wallet records per (master fingerprint, network).

use super::descriptor::{Wallet, WalletRecord};
use super::Network;
use crate::core::paths;
use crate::error::{SignerError, SignerResult};
use crate::storage::StorageMedium;
use bitcoin::bip32::Fingerprint;
use std::sync::Arc;

#[derive(Clone)]
pub struct WalletRegistry {
    medium: Arc<dyn StorageMedium>,
}

impl std::fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WalletRegistry")
    }
}

impl WalletRegistry {
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self { Self { medium } }

    fn path(fingerprint: Fingerprint, network: Network) -> String {
        paths::wallets::record(&fingerprint.to_string(), network.id())
    }

    /// True when a file exists for the pair, readable or not.
    pub fn has_record(&self, fingerprint: Fingerprint, network: Network) -> SignerResult<bool> {
        Ok(self.medium.read(&Self::path(fingerprint, network))?.is_some())
    }

    /// Unparseable descriptors are skipped. A missing or corrupt file reads as empty.
    pub fn load(&self, fingerprint: Fingerprint, network: Network) -> SignerResult<Vec<Wallet>> {
        let path = Self::path(fingerprint, network);
        let raw = match self.medium.read(&path)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Vec::new()),
        };
        let records: Vec<WalletRecord> = match serde_json::from_slice(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "wallet file unreadable, ignoring");
                return Ok(Vec::new());
            }
        };

        let mut wallets: Vec<Wallet> = Vec::with_capacity(records.len());
        for record in &records {
            if wallets.iter().any(|w| w.name() == record.name) {
                tracing::warn!(wallet = %record.name, "duplicate wallet name skipped");
                continue;
            }
            match Wallet::from_record(record) {
                Ok(wallet) => wallets.push(wallet),
                Err(e) => tracing::warn!(wallet = %record.name, error = %e, "skipping wallet"),
            }
        }
        Ok(wallets)
    }

    pub fn save(&self, fingerprint: Fingerprint, network: Network, wallets: &[Wallet]) -> SignerResult<()> {
        let records: Vec<WalletRecord> = wallets.iter().map(Wallet::to_record).collect();
        let data = serde_json::to_vec_pretty(&records)
            .map_err(|e| SignerError::Persistence(format!("wallet json: {e}")))?;
        self.medium.write(&Self::path(fingerprint, network), &data)?;
        Ok(())
    }
}
