//! KeyStore - master extended private key, loaded once a seed is known.

use crate::error::{SignerError, SignerResult};
use crate::wallet::Network;
use bitcoin::bip32::{DerivationPath, Fingerprint, Xpriv, Xpub};
use bitcoin::psbt::{Psbt, SigningKeys};
use bitcoin::secp256k1::Secp256k1;
use std::str::FromStr;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeyStore {
    master: Option<Xpriv>,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.fingerprint() {
            Ok(fp) => write!(f, "KeyStore({fp})"),
            Err(_) => f.write_str("KeyStore(empty)"),
        }
    }
}

impl KeyStore {
    pub fn new() -> Self { Self::default() }

    /// Replaces any previously loaded master key.
    pub fn load_seed(&mut self, seed: &[u8], network: Network) -> SignerResult<()> {
        let master = Xpriv::new_master(network.to_bitcoin(), seed)
            .map_err(|e| SignerError::Configuration(format!("master key: {e}")))?;
        self.master = Some(master);
        Ok(())
    }

    pub fn from_seed(seed: &[u8], network: Network) -> SignerResult<Self> {
        let mut store = Self::new();
        store.load_seed(seed, network)?;
        Ok(store)
    }

    pub fn is_initialized(&self) -> bool { self.master.is_some() }

    fn master(&self) -> SignerResult<&Xpriv> {
        self.master.as_ref().ok_or_else(SignerError::not_keyed)
    }

    pub fn fingerprint(&self) -> SignerResult<Fingerprint> {
        Ok(self.master()?.fingerprint(&Secp256k1::new()))
    }

    /// Account-level xpub at `path`, encoded for `network`.
    pub fn account_xpub(&self, path: &str, network: Network) -> SignerResult<Xpub> {
        let secp = Secp256k1::new();
        let path = DerivationPath::from_str(path)
            .map_err(|e| SignerError::Configuration(format!("derivation path {path}: {e}")))?;
        let child = self
            .master()?
            .derive_priv(&secp, &path)
            .map_err(|e| SignerError::Configuration(format!("derive: {e}")))?;
        let mut xpub = Xpub::from_priv(&secp, &child);
        xpub.network = network.to_bitcoin().into();
        Ok(xpub)
    }

    /// Adds partial signatures for every input whose derivation records point at
    /// this master key. Returns the number of signatures produced.
    pub fn sign(&self, psbt: &mut Psbt) -> SignerResult<usize> {
        let secp = Secp256k1::new();
        let used = psbt.sign(self.master()?, &secp).map_err(|(_, errors)| {
            let detail = errors
                .iter()
                .map(|(i, e)| format!("input {i}: {e}"))
                .collect::<Vec<_>>()
                .join(", ");
            SignerError::Signing(detail)
        })?;

        let count = used
            .values()
            .map(|keys| match keys {
                SigningKeys::Ecdsa(v) => v.len(),
                SigningKeys::Schnorr(v) => v.len(),
            })
            .sum();
        Ok(count)
    }
}
