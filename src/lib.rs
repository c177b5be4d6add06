//! Beesigner: control core of an air-gapped Bitcoin signer.
//!
//! # Architecture
//!
//! ```text
//! CaptureDevice ──poll──┐                         ┌──► Screen
//!                       ▼                         │
//! OperatorEvent ──► WorkflowController (SessionState) ──► StorageMedium
//!                       │
//!                       ├── KeyLifecycleManager  generate / recover / load / erase
//!                       ├── NetworkWalletManager network, default paths, wallets
//!                       ├── SigningPipeline      scan → parse → validate → confirm → sign → redact → emit
//!                       └── verify               address + index against known wallets
//!
//! TickClock (30ms) ──► controller.tick()
//! ```
//!
//! # Invariants
//!
//! | Never | Enforced in |
//! |-------|-------------|
//! | sign without operator confirmation | `signing::SigningPipeline::confirm` |
//! | re-export more metadata than the signatures | `signing::redact` |
//! | mix wallets across networks | `wallet::NetworkWalletManager::select` |
//! | commit half a workflow to the session | `controller::WorkflowController` |
//!
//! # Features
//!
//! - `native` - simulator binary, filesystem data dir, tokio loop, log subscriber
//!
//! # Usage
//!
//! ```ignore
//! use beesigner::{MemoryMedium, OperatorEvent, QueuedCapture, SignerConfig, WorkflowController};
//! use std::sync::Arc;
//!
//! let (capture, feed) = QueuedCapture::new();
//! let mut controller = WorkflowController::new(
//!     &SignerConfig::default(),
//!     Arc::new(MemoryMedium::new()),
//!     my_screen,
//!     capture,
//! );
//! controller.start();
//! controller.handle(OperatorEvent::Choose(1));
//! controller.handle(OperatorEvent::Text("abandon abandon ... about".into()));
//! controller.handle(OperatorEvent::Text(String::new()));
//!
//! controller.handle(OperatorEvent::Choose(2)); // Sign transaction
//! feed.scan(psbt_base64);
//! controller.tick();
//! ```

// =============================================================================
// Shared modules
// =============================================================================
pub mod channel;
pub mod clock;
pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod keys;
pub mod session;
pub mod signing;
pub mod storage;
pub mod verify;
pub mod wallet;

// =============================================================================
// Native-only modules (tokio loop, log subscriber)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod runtime;

// =============================================================================
// Re-exports
// =============================================================================
pub use channel::{CaptureDevice, CaptureFeed, QueuedCapture, Screen};
pub use clock::{ClockConfig, TickClock, TickOutcome};
pub use config::{SignerConfig, StorageMode};
pub use controller::{MenuAction, MenuId, MenuItem, OperatorEvent, View, WorkflowController};
pub use error::{SignerError, SignerResult};
pub use keys::{Entropy, KeyLifecycleManager, KeyStore};
pub use session::SessionState;
pub use signing::{PipelineState, SignedExport, SigningPipeline, SpendSummary, StepOutcome};
pub use storage::{FileMedium, MemoryMedium, RecklessStore, StorageMedium};
pub use verify::{AddressRequest, VerifiedAddress, VerifyError};
pub use wallet::{DefaultDerivationPaths, Network, NetworkWalletManager, Wallet, WalletRegistry};

#[cfg(feature = "native")]
pub use runtime::{install_signal_handlers, Shutdown};
