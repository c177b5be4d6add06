//! Wallet - networks, descriptors and the per-network wallet list
//!
//! ```text
//! NetworkWalletManager::select(network)
//!     │
//!     ├── DefaultDerivationPaths::for_network   m/84h/<coin>h/0h, m/48h/<coin>h/0h/2h
//!     │
//!     └── keyed? ── WalletRegistry::load(fp, network)
//!                        │ empty
//!                        ▼
//!                   "Default" wpkh([fp/84h/<coin>h/0h]xpub/_) ── WalletRegistry::save
//! ```

mod descriptor;
mod manager;
mod network;
mod registry;

pub use descriptor::{key_expression, ScriptKind, Wallet, WalletRecord, CHANGE, RECEIVE};
pub use manager::{MasterKey, NetworkWalletManager};
pub use network::{DefaultDerivationPaths, Network};
pub use registry::WalletRegistry;
