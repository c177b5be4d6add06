//! Reckless storage - plaintext entropy record, written only on operator request.

use super::StorageMedium;
use crate::error::{SignerError, SignerResult};
use crate::keys::Entropy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroize;

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecklessRecord {
    entropy: String,
}

impl Drop for RecklessRecord {
    fn drop(&mut self) { self.entropy.zeroize(); }
}

#[derive(Clone)]
pub struct RecklessStore {
    medium: Arc<dyn StorageMedium>,
    path: String,
}

impl std::fmt::Debug for RecklessStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecklessStore").field("path", &self.path).finish_non_exhaustive()
    }
}

impl RecklessStore {
    pub fn new(medium: Arc<dyn StorageMedium>, path: impl Into<String>) -> Self {
        Self { medium, path: path.into() }
    }

    pub fn path(&self) -> &str { &self.path }

    /// Write, read back, compare. Only a byte-identical read-back counts as saved.
    pub fn save(&self, entropy: &Entropy) -> SignerResult<()> {
        let record = RecklessRecord { entropy: entropy.to_hex() };
        let mut encoded = serde_json::to_vec(&record)
            .map_err(|e| SignerError::Persistence(format!("reckless json: {e}")))?;

        let result = self.write_verified(&encoded);
        encoded.zeroize();
        result?;
        tracing::info!(path = %self.path, "entropy saved to storage");
        Ok(())
    }

    fn write_verified(&self, encoded: &[u8]) -> SignerResult<()> {
        self.medium.write(&self.path, encoded)?;
        let mut back = self
            .medium
            .read(&self.path)?
            .ok_or_else(|| SignerError::Persistence("record missing after write".into()))?;
        let matches = back.as_slice() == encoded;
        back.zeroize();
        if !matches {
            return Err(SignerError::Persistence("read-back mismatch".into()));
        }
        Ok(())
    }

    /// Any failure is a soft `None`.
    pub fn load(&self) -> Option<Entropy> {
        let mut raw = match self.medium.read(&self.path) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "reckless read failed");
                return None;
            }
        };
        let parsed: Result<RecklessRecord, _> = serde_json::from_slice(&raw);
        raw.zeroize();
        let record = match parsed {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "reckless record malformed");
                return None;
            }
        };
        match Entropy::from_hex(&record.entropy) {
            Ok(entropy) => Some(entropy),
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "reckless entropy rejected");
                None
            }
        }
    }

    /// Present and non-empty.
    pub fn exists(&self) -> bool {
        matches!(self.medium.read(&self.path), Ok(Some(raw)) if !raw.is_empty())
    }

    /// Idempotent.
    pub fn delete(&self) -> SignerResult<()> {
        if self.medium.remove(&self.path)? {
            tracing::info!(path = %self.path, "entropy removed from storage");
        }
        Ok(())
    }
}
