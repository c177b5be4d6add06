//! Wallet descriptors
//!
//! Accepted templates, `_` standing for `<change>/<index>`:
//!
//! ```text
//! wpkh([<fp>/<origin path>]<xpub>/_)
//! sh(wpkh([<fp>/<origin path>]<xpub>/_))
//! ```

use crate::error::{SignerError, SignerResult};
use crate::wallet::Network;
use bitcoin::bip32::{ChildNumber, DerivationPath, Fingerprint, KeySource, Xpub};
use bitcoin::secp256k1::{self, Secp256k1};
use bitcoin::{Address, CompressedPublicKey, Script};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const RECEIVE: u32 = 0;
pub const CHANGE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Native segwit
    Wpkh,
    /// Nested segwit
    ShWpkh,
}

/// Persisted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    name: String,
    descriptor: String,
    fingerprint: Fingerprint,
    origin: DerivationPath,
    xpub: Xpub,
    kind: ScriptKind,
}

impl Wallet {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> SignerResult<Self> {
        let descriptor = descriptor.into();
        let bad = |why: &str| SignerError::Configuration(format!("descriptor {descriptor}: {why}"));

        let (kind, body) = if let Some(inner) = descriptor.strip_prefix("sh(wpkh(").and_then(|s| s.strip_suffix("))")) {
            (ScriptKind::ShWpkh, inner)
        } else if let Some(inner) = descriptor.strip_prefix("wpkh(").and_then(|s| s.strip_suffix(')')) {
            (ScriptKind::Wpkh, inner)
        } else {
            return Err(bad("unsupported script type"));
        };

        let body = body.strip_prefix('[').ok_or_else(|| bad("missing key origin"))?;
        let (origin, key) = body.split_once(']').ok_or_else(|| bad("unterminated key origin"))?;
        let xpub_str = key.strip_suffix("/_").ok_or_else(|| bad("expected /_ suffix"))?;

        let (fp_str, path_str) = origin.split_once('/').unwrap_or((origin, ""));
        let fingerprint = Fingerprint::from_str(fp_str).map_err(|e| bad(&e.to_string()))?;
        let origin = DerivationPath::from_str(path_str).map_err(|e| bad(&e.to_string()))?;
        let xpub = Xpub::from_str(xpub_str).map_err(|e| bad(&e.to_string()))?;

        Ok(Self { name: name.into(), descriptor, fingerprint, origin, xpub, kind })
    }

    /// Single-sig native segwit wallet for an account key.
    pub fn single_sig(name: impl Into<String>, fingerprint: Fingerprint, account_path: &str, xpub: &Xpub) -> SignerResult<Self> {
        let descriptor = format!("wpkh({}/_)", key_expression(fingerprint, account_path, xpub));
        Self::new(name, descriptor)
    }

    pub fn from_record(record: &WalletRecord) -> SignerResult<Self> {
        Self::new(record.name.clone(), record.descriptor.clone())
    }

    pub fn to_record(&self) -> WalletRecord {
        WalletRecord { name: self.name.clone(), descriptor: self.descriptor.clone() }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn descriptor(&self) -> &str { &self.descriptor }
    pub fn fingerprint(&self) -> Fingerprint { self.fingerprint }
    pub fn kind(&self) -> ScriptKind { self.kind }

    fn child_key(&self, change: u32, index: u32) -> SignerResult<CompressedPublicKey> {
        let path = [normal(change)?, normal(index)?];
        let child = self
            .xpub
            .derive_pub(&Secp256k1::verification_only(), &path)
            .map_err(|e| SignerError::Configuration(format!("derive {change}/{index}: {e}")))?;
        Ok(child.to_pub())
    }

    fn address_for(&self, key: &CompressedPublicKey, network: Network) -> Address {
        match self.kind {
            ScriptKind::Wpkh => Address::p2wpkh(key, network.to_bitcoin()),
            ScriptKind::ShWpkh => Address::p2shwpkh(key, network.to_bitcoin()),
        }
    }

    pub fn derive_address(&self, change: u32, index: u32, network: Network) -> SignerResult<Address> {
        Ok(self.address_for(&self.child_key(change, index)?, network))
    }

    /// Receive address at `index`.
    pub fn address(&self, index: u32, network: Network) -> SignerResult<Address> {
        self.derive_address(RECEIVE, index, network)
    }

    /// `(change, index)` when one of the derivation records belongs to this
    /// wallet and reproduces `script_pubkey`.
    pub fn owns(
        &self,
        script_pubkey: &Script,
        derivations: &BTreeMap<secp256k1::PublicKey, KeySource>,
        network: Network,
    ) -> Option<(u32, u32)> {
        derivations.iter().find_map(|(pubkey, (fp, path))| {
            if *fp != self.fingerprint {
                return None;
            }
            let (change, index) = self.branch_of(path)?;
            let key = self.child_key(change, index).ok()?;
            if key.0 != *pubkey {
                return None;
            }
            (self.address_for(&key, network).script_pubkey().as_script() == script_pubkey).then_some((change, index))
        })
    }

    fn branch_of(&self, path: &DerivationPath) -> Option<(u32, u32)> {
        let origin: &[ChildNumber] = self.origin.as_ref();
        let full: &[ChildNumber] = path.as_ref();
        let rest = full.strip_prefix(origin)?;
        match rest {
            [ChildNumber::Normal { index: change }, ChildNumber::Normal { index }] if *change <= CHANGE => {
                Some((*change, *index))
            }
            _ => None,
        }
    }
}

/// `[fp/path]xpub`
pub fn key_expression(fingerprint: Fingerprint, path: &str, xpub: &Xpub) -> String {
    let path = path.trim_start_matches('m').trim_start_matches('/');
    if path.is_empty() {
        format!("[{fingerprint}]{xpub}")
    } else {
        format!("[{fingerprint}/{path}]{xpub}")
    }
}

fn normal(index: u32) -> SignerResult<ChildNumber> {
    ChildNumber::from_normal_idx(index).map_err(|_| SignerError::Configuration(format!("index out of range: {index}")))
}
