//! NetworkWalletManager - network switch, default paths, wallet load/synthesis.

use super::descriptor::{key_expression, Wallet};
use super::{DefaultDerivationPaths, Network, WalletRegistry};
use crate::core::paths::DEFAULT_WALLET;
use crate::error::SignerResult;
use crate::session::SessionState;

/// Row of the master keys menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterKey {
    pub label: &'static str,
    pub path: String,
    /// `[fp/path]xpub`
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct NetworkWalletManager {
    registry: WalletRegistry,
}

impl NetworkWalletManager {
    pub fn new(registry: WalletRegistry) -> Self { Self { registry } }

    pub fn registry(&self) -> &WalletRegistry { &self.registry }

    /// Builds the new network's paths and wallet list, then commits them in
    /// one step. On error the session is untouched.
    pub fn select(&self, session: &mut SessionState, network: Network) -> SignerResult<()> {
        let paths = DefaultDerivationPaths::for_network(network);
        let wallets = if session.is_keyed() {
            self.load_or_synthesize(session, network, &paths)?
        } else {
            Vec::new()
        };

        tracing::info!(network = network.id(), wallets = wallets.len(), "network selected");
        session.network = network;
        session.paths = paths;
        session.wallets = wallets;
        Ok(())
    }

    /// Unknown ids fail the call.
    pub fn select_by_id(&self, session: &mut SessionState, id: &str) -> SignerResult<()> {
        let network = Network::from_id(id)?;
        self.select(session, network)
    }

    fn load_or_synthesize(
        &self,
        session: &SessionState,
        network: Network,
        paths: &DefaultDerivationPaths,
    ) -> SignerResult<Vec<Wallet>> {
        let fingerprint = session.keystore.fingerprint()?;
        let wallets = self.registry.load(fingerprint, network)?;
        if !wallets.is_empty() {
            return Ok(wallets);
        }

        let xpub = session.keystore.account_xpub(&paths.single_sig, network)?;
        let wallet = Wallet::single_sig(DEFAULT_WALLET, fingerprint, &paths.single_sig, &xpub)?;
        // A file with nothing usable in it stays as written; the default lives in memory only.
        if self.registry.has_record(fingerprint, network)? {
            tracing::warn!(network = network.id(), %fingerprint, "no usable wallets in stored file, using default");
        } else {
            self.registry.save(fingerprint, network, std::slice::from_ref(&wallet))?;
            tracing::info!(network = network.id(), %fingerprint, "registered default wallet");
        }
        Ok(vec![wallet])
    }

    pub fn master_keys(&self, session: &SessionState) -> SignerResult<Vec<MasterKey>> {
        let fingerprint = session.keystore.fingerprint()?;
        session
            .paths
            .entries()
            .into_iter()
            .map(|(label, path)| {
                let xpub = session.keystore.account_xpub(path, session.network)?;
                Ok(MasterKey { label, path: path.to_string(), key: key_expression(fingerprint, path, &xpub) })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyStore;
    use crate::storage::{MemoryMedium, StorageMedium};
    use bip39::Mnemonic;
    use std::sync::Arc;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn keyed_session() -> SessionState {
        let seed = Mnemonic::parse(TEST_MNEMONIC).unwrap().to_seed("");
        let mut session = SessionState::default();
        session.keystore = KeyStore::from_seed(&seed, Network::Testnet).unwrap();
        session
    }

    fn manager() -> (Arc<MemoryMedium>, NetworkWalletManager) {
        let medium = Arc::new(MemoryMedium::new());
        (medium.clone(), NetworkWalletManager::new(WalletRegistry::new(medium)))
    }

    #[test]
    fn unkeyed_select_only_sets_network() {
        let (medium, manager) = manager();
        let mut session = SessionState::default();
        manager.select(&mut session, Network::Regtest).unwrap();
        assert_eq!(session.network, Network::Regtest);
        assert_eq!(session.paths.single_sig, "m/84h/1h/0h");
        assert!(session.wallets.is_empty());
        assert!(medium.snapshot().is_empty());
    }

    #[test]
    fn synthesizes_and_persists_default_wallet() {
        let (medium, manager) = manager();
        let mut session = keyed_session();
        manager.select(&mut session, Network::Testnet).unwrap();

        assert_eq!(session.wallets.len(), 1);
        let wallet = &session.wallets[0];
        assert_eq!(wallet.name(), "Default");
        assert!(wallet.descriptor().starts_with("wpkh([73c5da0a/84h/1h/0h]tpub"));
        assert!(medium.snapshot().contains_key("wallets/73c5da0a/test.json"));

        // Second select loads rather than re-creating.
        let before = medium.snapshot();
        manager.select(&mut session, Network::Testnet).unwrap();
        assert_eq!(before, medium.snapshot());
    }

    #[test]
    fn unusable_wallet_file_is_left_alone() {
        let (medium, manager) = manager();
        let stored = br#"[{"name":"Vault","descriptor":"wsh(sortedmulti(2,[73c5da0a/48h/1h/0h/2h]tpubA/0/*,[f00dbabe/48h/1h/0h/2h]tpubB/0/*))"}]"#;
        medium.write("wallets/73c5da0a/test.json", stored).unwrap();

        let mut session = keyed_session();
        manager.select(&mut session, Network::Testnet).unwrap();

        assert_eq!(session.wallets.len(), 1);
        assert_eq!(session.wallets[0].name(), "Default");
        assert_eq!(medium.read("wallets/73c5da0a/test.json").unwrap().as_deref(), Some(&stored[..]));
    }

    #[test]
    fn switch_replaces_wallet_list() {
        let (_, manager) = manager();
        let mut session = keyed_session();
        manager.select(&mut session, Network::Testnet).unwrap();
        let testnet_wallets = session.wallets.clone();

        manager.select(&mut session, Network::Mainnet).unwrap();
        assert_eq!(session.wallets.len(), 1);
        assert_ne!(session.wallets, testnet_wallets);
        assert!(session.wallets[0].descriptor().contains("/84h/0h/0h]xpub"));
        assert_eq!(session.paths.multisig, "m/48h/0h/0h/2h");
    }

    #[test]
    fn unknown_id_leaves_session_untouched() {
        let (_, manager) = manager();
        let mut session = keyed_session();
        manager.select(&mut session, Network::Testnet).unwrap();
        let snapshot = session.clone();

        let err = manager.select_by_id(&mut session, "litecoin").unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(snapshot, session);

        manager.select_by_id(&mut session, "signet").unwrap();
        assert_eq!(session.network, Network::Signet);
    }

    #[test]
    fn master_keys_cover_default_paths() {
        let (_, manager) = manager();
        let mut session = keyed_session();
        manager.select(&mut session, Network::Mainnet).unwrap();

        let keys = manager.master_keys(&session).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].label, "Single key");
        assert_eq!(
            keys[0].key,
            "[73c5da0a/84h/0h/0h]xpub6CatWdiZiodmUeTDp8LT5or8nmbKNcuyvz7WyksVFkKB4RHwCD3XyuvPEbvqAQY3rAPshWcMLoP2fMFMKHPJ4ZeZXYVUhLv1VMrjPC7PW6V"
        );
        assert_eq!(keys[1].path, "m/48h/0h/0h/2h");
    }

    #[test]
    fn master_keys_need_a_seed() {
        let (_, manager) = manager();
        assert!(manager.master_keys(&SessionState::default()).is_err());
    }
}
