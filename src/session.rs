//! SessionState - everything security-relevant the device knows between
//! power-on and power-off. Owned and written by the controller only.

use crate::keys::{Entropy, KeyStore};
use crate::wallet::{DefaultDerivationPaths, Network, Wallet};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub network: Network,
    pub paths: DefaultDerivationPaths,
    pub keystore: KeyStore,
    /// The single live copy of the root secret.
    pub entropy: Option<Entropy>,
    pub wallets: Vec<Wallet>,
}

impl SessionState {
    pub fn new(network: Network) -> Self {
        Self { network, paths: DefaultDerivationPaths::for_network(network), ..Self::default() }
    }

    /// Seed loaded.
    pub fn is_keyed(&self) -> bool { self.keystore.is_initialized() }

    pub fn wallet(&self, name: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.name() == name)
    }

    /// Drops the secret and everything derived from it.
    pub fn forget_keys(&mut self) {
        self.keystore = KeyStore::new();
        self.entropy = None;
        self.wallets.clear();
    }
}
