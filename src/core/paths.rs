//! Path and name constants
//!
//! Logical paths are relative to the storage medium root. The file medium maps
//! them under the data directory; on hardware the root is the flash mount.

/// Reckless (plaintext) entropy record.
pub const RECKLESS: &str = "reckless.json";

/// Wallet records
pub mod wallets {
    pub const PREFIX: &str = "wallets";

    /// `wallets/<fingerprint>/<network>.json`
    pub fn record(fingerprint: &str, network_id: &str) -> String {
        format!("{}/{}/{}.json", PREFIX, fingerprint, network_id)
    }
}

/// Name the auto-synthesized single-sig wallet is registered under.
pub const DEFAULT_WALLET: &str = "Default";

/// Derivation path templates, `{coin}` is the network's coin type.
pub mod derivation {
    pub const SINGLE_SIG: &str = "m/84h/{coin}h/0h";
    pub const MULTISIG: &str = "m/48h/{coin}h/0h/2h";

    pub const SINGLE_SIG_LABEL: &str = "Single key";
    pub const MULTISIG_LABEL: &str = "Multisig";

    pub fn render(template: &str, coin_type: u32) -> String {
        template.replace("{coin}", &coin_type.to_string())
    }
}

/// Environment variables read by the native binary
pub mod env {
    pub const ROOT: &str = "BEESIGNER_ROOT";
    pub const NETWORK: &str = "BEESIGNER_NETWORK";
    pub const TICK_MS: &str = "BEESIGNER_TICK_MS";
    pub const WORDS: &str = "BEESIGNER_WORDS";
    pub const LOG_JSON: &str = "BEESIGNER_LOG_JSON";
}
