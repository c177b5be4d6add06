//! Shared fixtures: a screen that records what it was asked to show, and a
//! PSBT builder spending from the well-known test seed.

#![allow(dead_code)]

use beesigner::channel::{CaptureFeed, QueuedCapture, Screen};
use beesigner::controller::{MenuAction, MenuItem, OperatorEvent, WorkflowController};
use beesigner::signing::SpendSummary;
use beesigner::storage::StorageMedium;
use beesigner::{KeyStore, Network, SignerConfig, Wallet};
use bip39::Mnemonic;
use bitcoin::absolute::LockTime;
use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::hashes::Hash;
use bitcoin::psbt::Psbt;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, NetworkKind, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use std::str::FromStr;
use std::sync::Arc;

// Well-known test vectors, never use with real funds
pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const OTHER_MNEMONIC: &str = "legal winner thank year wave sausage worth useful legal winner thank yellow";
pub const TEST_FINGERPRINT: &str = "73c5da0a";
pub const EXTERNAL_TESTNET: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Menu { title: String, labels: Vec<String> },
    Error(String),
    Alert { title: String, message: String },
    Prompt(String),
    Progress(String),
    Qr { title: String, payload: String },
    Mnemonic(String),
    Candidates(Vec<String>),
    Confirmation(SpendSummary),
}

#[derive(Debug, Default)]
pub struct RecordingScreen {
    pub shown: Vec<Shown>,
}

impl RecordingScreen {
    pub fn last(&self) -> Option<&Shown> { self.shown.last() }

    pub fn errors(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Error(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_qr(&self) -> Option<&str> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Qr { payload, .. } => Some(payload.as_str()),
            _ => None,
        })
    }

    pub fn last_confirmation(&self) -> Option<&SpendSummary> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Confirmation(summary) => Some(summary),
            _ => None,
        })
    }

    pub fn last_menu(&self) -> Option<(&str, &[String])> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Menu { title, labels } => Some((title.as_str(), labels.as_slice())),
            _ => None,
        })
    }
}

impl Screen for RecordingScreen {
    fn show_menu(&mut self, title: &str, items: &[MenuItem]) {
        let labels = items.iter().map(|i| i.label.clone()).collect();
        self.shown.push(Shown::Menu { title: title.into(), labels });
    }
    fn show_error(&mut self, message: &str) { self.shown.push(Shown::Error(message.into())); }
    fn show_alert(&mut self, title: &str, message: &str) {
        self.shown.push(Shown::Alert { title: title.into(), message: message.into() });
    }
    fn show_prompt(&mut self, title: &str, _note: &str) { self.shown.push(Shown::Prompt(title.into())); }
    fn show_progress(&mut self, message: &str) { self.shown.push(Shown::Progress(message.into())); }
    fn show_qr(&mut self, title: &str, payload: &str) {
        self.shown.push(Shown::Qr { title: title.into(), payload: payload.into() });
    }
    fn show_mnemonic(&mut self, phrase: &str, _items: &[MenuItem]) { self.shown.push(Shown::Mnemonic(phrase.into())); }
    fn show_candidates(&mut self, candidates: &[&str]) {
        self.shown.push(Shown::Candidates(candidates.iter().map(|c| c.to_string()).collect()));
    }
    fn show_confirmation(&mut self, summary: &SpendSummary) {
        self.shown.push(Shown::Confirmation(summary.clone()));
    }
}

pub type TestController = WorkflowController<RecordingScreen, QueuedCapture>;

pub fn controller(config: &SignerConfig, medium: Arc<dyn StorageMedium>) -> (TestController, CaptureFeed) {
    let (capture, feed) = QueuedCapture::new();
    let mut controller = WorkflowController::new(config, medium, RecordingScreen::default(), capture);
    controller.start();
    (controller, feed)
}

/// Recovers `phrase` with an empty password.
pub fn unlock(controller: &mut TestController, phrase: &str) {
    controller.perform(MenuAction::EnterPhrase);
    controller.handle(OperatorEvent::Text(phrase.into()));
    controller.handle(OperatorEvent::Text(String::new()));
    assert!(controller.session().is_keyed(), "unlock failed: {:?}", controller.screen().errors());
}

/// Signs whatever `payload` is, confirming when asked. Returns the exported base64.
pub fn sign_payload(controller: &mut TestController, feed: &CaptureFeed, payload: &str) -> Option<String> {
    controller.perform(MenuAction::SignTransaction);
    feed.scan(payload);
    for _ in 0..4 {
        controller.tick();
    }
    controller.handle(OperatorEvent::Confirm);
    for _ in 0..4 {
        controller.tick();
    }
    controller.screen().last_qr().map(str::to_string)
}

pub fn seed(phrase: &str) -> [u8; 64] {
    Mnemonic::parse(phrase).expect("mnemonic").to_seed("")
}

pub fn account_path(network: Network) -> String {
    format!("m/84h/{}h/0h", network.coin_type())
}

pub fn default_wallet(phrase: &str, network: Network) -> Wallet {
    let keys = KeyStore::from_seed(&seed(phrase), network).expect("keystore");
    let path = account_path(network);
    let xpub = keys.account_xpub(&path, network).expect("xpub");
    Wallet::single_sig("Default", keys.fingerprint().expect("fingerprint"), &path, &xpub).expect("wallet")
}

pub fn external_script() -> ScriptBuf {
    Address::from_str(EXTERNAL_TESTNET)
        .expect("address")
        .assume_checked()
        .script_pubkey()
}

/// Testnet PSBT spending receive #0 of `phrase`'s default wallet to an
/// external address, with change back to change #0.
pub fn spend_psbt(phrase: &str, input: u64, send: u64, change: u64) -> Psbt {
    let network = Network::Testnet;
    let wallet = default_wallet(phrase, network);
    let secp = Secp256k1::new();
    let master = Xpriv::new_master(NetworkKind::Test, &seed(phrase)).expect("master");
    let fingerprint = master.fingerprint(&secp);
    let key_at = |change: u32, index: u32| {
        let path = DerivationPath::from_str(&format!("{}/{change}/{index}", account_path(network))).expect("path");
        let key = master.derive_priv(&secp, &path).expect("derive").to_priv().public_key(&secp);
        (key.inner, (fingerprint, path))
    };

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from_byte_array([9; 32]), 1),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::new(),
        }],
        output: vec![
            TxOut { value: Amount::from_sat(send), script_pubkey: external_script() },
            TxOut {
                value: Amount::from_sat(change),
                script_pubkey: wallet.derive_address(1, 0, network).expect("change").script_pubkey(),
            },
        ],
    };
    let mut psbt = Psbt::from_unsigned_tx(tx).expect("psbt");
    psbt.inputs[0].witness_utxo = Some(TxOut {
        value: Amount::from_sat(input),
        script_pubkey: wallet.address(0, network).expect("receive").script_pubkey(),
    });
    let (key, source) = key_at(0, 0);
    psbt.inputs[0].bip32_derivation.insert(key, source);
    let (key, source) = key_at(1, 0);
    psbt.outputs[1].bip32_derivation.insert(key, source);
    psbt
}
