//! WorkflowController - owns the session and routes operator input
//!
//! ```text
//!            Init ──generate──► NewKey ──continue──┐
//!              │ ──enter phrase──► RecoveryPrompt ─┤
//!              │ ──load─────────────────────────────┤
//!              ▼                                    ▼
//!            Main ◄───────────────────────────── PasswordPrompt
//!              ├── Wallets / Master keys / Networks / Reckless
//!              ├── Sign transaction ──► Signing (pipeline, one step per tick)
//!              └── Verify address ───► Verifying (capture polled per tick)
//! ```
//!
//! Every workflow error stops at [`WorkflowController::handle`] or
//! [`WorkflowController::tick`]: the operator sees a message and lands on the
//! top-level menu. Session changes are built on a copy and committed last.

mod menu;

pub use menu::{
    init_menu, main_menu, master_keys_menu, networks_menu, new_key_menu, reckless_menu, wallets_menu, MenuAction,
    MenuId, MenuItem,
};

use crate::channel::{CaptureDevice, Screen};
use crate::config::SignerConfig;
use crate::error::{SignerError, SignerResult};
use crate::keys::{Entropy, KeyLifecycleManager, KeyStore};
use crate::session::SessionState;
use crate::signing::{SigningPipeline, StepOutcome};
use crate::storage::{RecklessStore, StorageMedium};
use crate::verify;
use crate::wallet::{Network, NetworkWalletManager, WalletRegistry};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Operator input, already decoded from buttons or keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorEvent {
    /// Menu item by position.
    Choose(usize),
    Back,
    Confirm,
    Decline,
    /// Submitted prompt text (recovery phrase, password).
    Text(String),
    /// Completion request for a partially typed word.
    Complete(String),
}

/// What the operator is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Menu(MenuId),
    RecoveryPrompt,
    PasswordPrompt,
    /// Alert or QR; back returns to the menu.
    Detail(MenuId),
    Signing,
    Verifying,
}

impl View {
    /// Free-text entry is open.
    pub fn is_prompt(self) -> bool {
        matches!(self, View::RecoveryPrompt | View::PasswordPrompt)
    }
}

pub struct WorkflowController<S: Screen, C: CaptureDevice> {
    session: SessionState,
    keys: KeyLifecycleManager,
    wallets: NetworkWalletManager,
    pipeline: SigningPipeline,
    screen: S,
    capture: C,
    word_count: usize,
    initial_network: Network,
    view: View,
    menu: Vec<MenuItem>,
    /// Secret between generate/recover/load and the password prompt.
    pending_entropy: Option<Entropy>,
}

impl<S: Screen, C: CaptureDevice> WorkflowController<S, C> {
    pub fn new(config: &SignerConfig, medium: Arc<dyn StorageMedium>, screen: S, capture: C) -> Self {
        let store = RecklessStore::new(medium.clone(), config.reckless_path.clone());
        Self {
            session: SessionState::new(config.network),
            keys: KeyLifecycleManager::new(store).with_candidate_limit(config.candidate_limit),
            wallets: NetworkWalletManager::new(WalletRegistry::new(medium)),
            pipeline: SigningPipeline::new(),
            screen,
            capture,
            word_count: config.word_count,
            initial_network: config.network,
            view: View::Menu(MenuId::Init),
            menu: Vec::new(),
            pending_entropy: None,
        }
    }

    /// Shows the first menu.
    pub fn start(&mut self) {
        tracing::info!(network = self.session.network.id(), "controller started");
        self.show_top();
    }

    pub fn session(&self) -> &SessionState { &self.session }
    pub fn keys(&self) -> &KeyLifecycleManager { &self.keys }
    pub fn pipeline(&self) -> &SigningPipeline { &self.pipeline }
    pub fn view(&self) -> View { self.view }
    /// Items of the menu on screen.
    pub fn menu(&self) -> &[MenuItem] { &self.menu }
    pub fn screen(&self) -> &S { &self.screen }
    pub fn screen_mut(&mut self) -> &mut S { &mut self.screen }
    pub fn capture_mut(&mut self) -> &mut C { &mut self.capture }

    pub fn handle(&mut self, event: OperatorEvent) {
        tracing::debug!(view = ?self.view, event = event_name(&event), "operator event");
        match event {
            OperatorEvent::Choose(position) => match self.view {
                View::Menu(_) => match self.menu.get(position).map(|item| item.action) {
                    Some(action) => self.perform(action),
                    None => tracing::debug!(position, "no such menu item"),
                },
                _ => tracing::debug!(position, "choice outside a menu"),
            },
            OperatorEvent::Back => self.back(),
            OperatorEvent::Confirm => match self.view {
                View::Signing => {
                    if self.pipeline.confirm() {
                        self.screen.show_progress("Signing...");
                    }
                }
                View::Detail(parent) => self.show_menu(parent),
                _ => {}
            },
            OperatorEvent::Decline => match self.view {
                View::Signing => {
                    self.pipeline.decline(&mut self.capture);
                    self.show_top();
                }
                _ => self.back(),
            },
            OperatorEvent::Text(text) => match self.view {
                View::RecoveryPrompt => {
                    let text = Zeroizing::new(text);
                    self.run(|c| c.recover(&text));
                }
                View::PasswordPrompt => {
                    let passphrase = Zeroizing::new(text);
                    self.run(|c| c.unlock(&passphrase));
                }
                _ => tracing::debug!("text outside a prompt"),
            },
            OperatorEvent::Complete(partial) => {
                if self.view == View::RecoveryPrompt {
                    let candidates = self.keys.word_candidates(&partial);
                    self.screen.show_candidates(&candidates);
                }
            }
        }
    }

    /// Runs a menu action.
    pub fn perform(&mut self, action: MenuAction) {
        tracing::debug!(?action, "menu action");
        self.run(|c| c.dispatch(action));
    }

    /// Once per scheduler tick.
    pub fn tick(&mut self) {
        match self.view {
            View::Signing => {
                let outcome = self.pipeline.tick(&self.session, &mut self.capture);
                self.on_step(outcome);
            }
            View::Verifying => self.poll_address(),
            _ => {}
        }
    }

    /// Switches network from outside the menus. An unknown id is returned to
    /// the caller; anything after that is handled like a menu action.
    pub fn select_network_by_id(&mut self, id: &str) -> SignerResult<()> {
        let network = Network::from_id(id)?;
        self.run(|c| {
            c.wallets.select(&mut c.session, network)?;
            c.show_top();
            Ok(())
        });
        Ok(())
    }

    fn run(&mut self, step: impl FnOnce(&mut Self) -> SignerResult<()>) {
        if let Err(e) = step(self) {
            self.fail(e);
        }
    }

    fn fail(&mut self, error: SignerError) {
        tracing::warn!(view = ?self.view, error = %error, "workflow failed");
        self.pipeline.cancel(&mut self.capture);
        self.pending_entropy = None;
        self.screen.show_error(&error.operator_message());
        self.show_top();
    }

    fn dispatch(&mut self, action: MenuAction) -> SignerResult<()> {
        match action {
            MenuAction::GenerateKey | MenuAction::RegenerateKey => {
                let entropy = self.keys.generate_new(self.word_count)?;
                self.pending_entropy = Some(entropy);
                self.show_new_key()
            }
            MenuAction::EnterPhrase => {
                self.view = View::RecoveryPrompt;
                self.screen.show_prompt("Enter your recovery phrase", "Words separated by spaces");
                Ok(())
            }
            MenuAction::LoadKey => {
                let entropy = self.keys.load_persisted()?;
                self.ask_password(entropy);
                Ok(())
            }
            MenuAction::ConfirmKey => {
                let entropy = self
                    .pending_entropy
                    .take()
                    .ok_or_else(|| SignerError::InputCapture("no key to continue with".into()))?;
                self.ask_password(entropy);
                Ok(())
            }
            MenuAction::Wallets => {
                self.require_keyed()?;
                self.show_menu(MenuId::Wallets);
                Ok(())
            }
            MenuAction::ShowWallet(index) => {
                let wallet = self
                    .session
                    .wallets
                    .get(index)
                    .ok_or_else(|| SignerError::Configuration(format!("no wallet #{index}")))?;
                let address = wallet.address(0, self.session.network)?;
                let message = format!("{}\n\nFirst address:\n{}", wallet.descriptor(), address);
                let title = wallet.name().to_string();
                self.view = View::Detail(MenuId::Wallets);
                self.screen.show_alert(&title, &message);
                Ok(())
            }
            MenuAction::MasterKeys => {
                self.require_keyed()?;
                self.show_menu(MenuId::MasterKeys);
                Ok(())
            }
            MenuAction::ShowMasterKey(index) => {
                let key = self
                    .wallets
                    .master_keys(&self.session)?
                    .into_iter()
                    .nth(index)
                    .ok_or_else(|| SignerError::Configuration(format!("no master key #{index}")))?;
                self.view = View::Detail(MenuId::MasterKeys);
                self.screen.show_alert(&format!("{} - {}", key.label, key.path), &key.key);
                Ok(())
            }
            MenuAction::SignTransaction => {
                self.require_keyed()?;
                self.pipeline.begin(&mut self.capture)?;
                self.view = View::Signing;
                self.screen.show_progress("Scan the transaction");
                Ok(())
            }
            MenuAction::VerifyAddress => {
                self.require_keyed()?;
                self.capture.stop();
                self.capture.start()?;
                self.view = View::Verifying;
                self.screen.show_progress("Scan the address");
                Ok(())
            }
            MenuAction::ChangePassword => {
                let entropy = self.session.entropy.clone().ok_or_else(SignerError::not_keyed)?;
                self.ask_password(entropy);
                Ok(())
            }
            MenuAction::NetworkMenu => {
                self.show_menu(MenuId::Networks);
                Ok(())
            }
            MenuAction::SelectNetwork(network) => {
                self.wallets.select(&mut self.session, network)?;
                self.show_top();
                Ok(())
            }
            MenuAction::Reckless => {
                self.require_keyed()?;
                self.show_menu(MenuId::Reckless);
                Ok(())
            }
            MenuAction::ShowPhrase => {
                let entropy = self.session.entropy.as_ref().ok_or_else(SignerError::not_keyed)?;
                let phrase = Zeroizing::new(entropy.phrase()?);
                self.view = View::Detail(MenuId::Reckless);
                self.screen.show_alert("Your recovery phrase", &phrase);
                Ok(())
            }
            MenuAction::SaveKey => {
                let entropy = self.session.entropy.as_ref().ok_or_else(SignerError::not_keyed)?;
                self.keys.save_persisted(entropy)?;
                self.view = View::Detail(MenuId::Reckless);
                self.screen.show_alert("Success!", "Your key is stored in flash in plain text");
                Ok(())
            }
            MenuAction::DeleteKey => {
                self.keys.erase_persisted()?;
                self.view = View::Detail(MenuId::Reckless);
                self.screen.show_alert("Success!", "Your key is deleted from flash");
                Ok(())
            }
            MenuAction::Back => {
                self.back();
                Ok(())
            }
        }
    }

    fn back(&mut self) {
        match self.view {
            View::Menu(MenuId::NewKey) | View::RecoveryPrompt | View::PasswordPrompt => {
                self.pending_entropy = None;
                self.show_top();
            }
            View::Menu(id) => self.show_menu(id.parent()),
            View::Detail(parent) => self.show_menu(parent),
            View::Signing | View::Verifying => {
                self.pipeline.cancel(&mut self.capture);
                self.show_top();
            }
        }
    }

    fn recover(&mut self, phrase: &str) -> SignerResult<()> {
        let entropy = self.keys.recover(phrase)?;
        self.ask_password(entropy);
        Ok(())
    }

    fn ask_password(&mut self, entropy: Entropy) {
        self.pending_entropy = Some(entropy);
        self.view = View::PasswordPrompt;
        self.screen.show_prompt("Enter your password", "Leave empty for none");
    }

    /// Derives the seed and commits key, entropy and wallets together.
    fn unlock(&mut self, passphrase: &str) -> SignerResult<()> {
        let entropy = self
            .pending_entropy
            .take()
            .ok_or_else(|| SignerError::InputCapture("no key to unlock".into()))?;
        let network = if self.session.is_keyed() { self.session.network } else { self.initial_network };

        let seed = KeyLifecycleManager::derive_seed(&entropy, passphrase)?;
        let mut next = self.session.clone();
        next.keystore = KeyStore::from_seed(&seed[..], network)?;
        next.entropy = Some(entropy);
        self.wallets.select(&mut next, network)?;

        let fingerprint = next.keystore.fingerprint()?;
        self.session = next;
        tracing::info!(%fingerprint, network = network.id(), "key loaded");
        self.show_menu(MenuId::Main);
        Ok(())
    }

    fn require_keyed(&self) -> SignerResult<()> {
        if self.session.is_keyed() {
            Ok(())
        } else {
            Err(SignerError::not_keyed())
        }
    }

    fn on_step(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Idle | StepOutcome::Pending => {}
            StepOutcome::NeedsConfirmation(summary) => self.screen.show_confirmation(&summary),
            StepOutcome::Emitted(export) => {
                self.view = View::Detail(MenuId::Main);
                self.screen.show_qr("Signed transaction", &export.base64);
            }
            StepOutcome::Cancelled | StepOutcome::Declined => self.show_top(),
            StepOutcome::Failed(e) => self.fail(e),
        }
    }

    fn poll_address(&mut self) {
        match self.capture.poll() {
            None => {}
            Some(Ok(payload)) => {
                self.capture.stop();
                match verify::verify(&self.session, &payload) {
                    Ok(verified) => {
                        let message = format!("{}\n\nbelongs to wallet \"{}\"", verified.address, verified.wallet_name);
                        self.view = View::Detail(MenuId::Main);
                        self.screen.show_alert(&verified.title(), &message);
                    }
                    Err(e) => self.fail(e.into()),
                }
            }
            Some(Err(reason)) => self.fail(SignerError::InputCapture(reason)),
        }
    }

    fn show_top(&mut self) {
        let top = if self.session.is_keyed() { MenuId::Main } else { MenuId::Init };
        self.show_menu(top);
    }

    fn show_new_key(&mut self) -> SignerResult<()> {
        let entropy = self.pending_entropy.as_ref().ok_or_else(|| SignerError::InputCapture("no key generated".into()))?;
        let phrase = Zeroizing::new(entropy.phrase()?);
        self.menu = new_key_menu();
        self.view = View::Menu(MenuId::NewKey);
        self.screen.show_mnemonic(&phrase, &self.menu);
        Ok(())
    }

    fn show_menu(&mut self, id: MenuId) {
        if id == MenuId::NewKey {
            if let Err(e) = self.show_new_key() {
                self.fail(e);
            }
            return;
        }
        let items = match id {
            MenuId::Init => init_menu(self.keys.has_persisted()),
            MenuId::Main => main_menu(self.session.network),
            MenuId::Wallets => wallets_menu(&self.session),
            MenuId::MasterKeys => master_keys_menu(&self.session),
            MenuId::Networks => networks_menu(),
            MenuId::Reckless => reckless_menu(),
            MenuId::NewKey => new_key_menu(),
        };
        self.menu = items;
        self.view = View::Menu(id);
        self.screen.show_menu(id.title(), &self.menu);
    }
}

fn event_name(event: &OperatorEvent) -> &'static str {
    match event {
        OperatorEvent::Choose(_) => "choose",
        OperatorEvent::Back => "back",
        OperatorEvent::Confirm => "confirm",
        OperatorEvent::Decline => "decline",
        OperatorEvent::Text(_) => "text",
        OperatorEvent::Complete(_) => "complete",
    }
}
