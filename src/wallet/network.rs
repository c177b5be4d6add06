//! Network - the single active chain. Everything wallet-related is scoped to it.

use crate::core::paths::derivation;
use crate::error::{SignerError, SignerResult};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network { Mainnet, #[default] Testnet, Regtest, Signet }

impl Network {
    /// Selector order.
    pub const ALL: [Network; 4] = [Network::Mainnet, Network::Testnet, Network::Regtest, Network::Signet];

    pub fn id(&self) -> &'static str {
        match self { Network::Mainnet => "main", Network::Testnet => "test", Network::Regtest => "regtest", Network::Signet => "signet" }
    }

    pub fn label(&self) -> &'static str {
        match self { Network::Mainnet => "Mainnet", Network::Testnet => "Testnet", Network::Regtest => "Regtest", Network::Signet => "Signet" }
    }

    /// SLIP-44 coin type used in account paths.
    pub fn coin_type(&self) -> u32 {
        match self { Network::Mainnet => 0, _ => 1 }
    }

    pub fn to_bitcoin(&self) -> bitcoin::Network {
        match self { Network::Mainnet => bitcoin::Network::Bitcoin, Network::Testnet => bitcoin::Network::Testnet, Network::Regtest => bitcoin::Network::Regtest, Network::Signet => bitcoin::Network::Signet }
    }

    /// Unknown ids are a configuration error.
    pub fn from_id(id: &str) -> SignerResult<Self> {
        Network::ALL
            .into_iter()
            .find(|n| n.id() == id)
            .ok_or_else(|| SignerError::unknown_network(id))
    }
}

impl FromStr for Network {
    type Err = SignerError;
    fn from_str(s: &str) -> SignerResult<Self> { Network::from_id(s) }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.label()) }
}

/// Account paths for the active network, rebuilt on every switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultDerivationPaths {
    pub single_sig: String,
    pub multisig: String,
}

impl DefaultDerivationPaths {
    pub fn for_network(network: Network) -> Self {
        let coin = network.coin_type();
        Self {
            single_sig: derivation::render(derivation::SINGLE_SIG, coin),
            multisig: derivation::render(derivation::MULTISIG, coin),
        }
    }

    /// `(label, path)` in menu order.
    pub fn entries(&self) -> [(&'static str, &str); 2] {
        [
            (derivation::SINGLE_SIG_LABEL, self.single_sig.as_str()),
            (derivation::MULTISIG_LABEL, self.multisig.as_str()),
        ]
    }
}

impl Default for DefaultDerivationPaths {
    fn default() -> Self { Self::for_network(Network::default()) }
}
