//! Signing - the security-critical transaction workflow
//!
//! ```text
//! Idle ─begin─► Scanning ─payload─► Parsing ─► Validating ─► AwaitingConfirmation
//!   ▲              │                                              │ confirm
//!   │            cancel                                           ▼
//!   └──────── Emitting ◄─ Redacting ◄─────────────────────── Signing
//!
//! any failure ─► Idle (StepOutcome::Failed)
//! ```
//!
//! One state per [`SigningPipeline::tick`]. Nothing is signed without an
//! explicit [`SigningPipeline::confirm`], and the pipeline never writes to
//! the session it reads from.

mod redact;
mod validate;

pub use redact::{decode, encode, redact};
pub use validate::{check_psbt, PendingTransaction, SendOutput, SpendSummary};

use crate::channel::CaptureDevice;
use crate::error::{SignerError, SignerResult};
use crate::session::SessionState;
use bitcoin::psbt::Psbt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Scanning,
    Parsing(String),
    Validating(Psbt),
    AwaitingConfirmation(PendingTransaction),
    Signing(PendingTransaction),
    Redacting { psbt: Psbt, signatures: usize },
    Emitting { psbt: Psbt, signatures: usize },
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Scanning => "scanning",
            PipelineState::Parsing(_) => "parsing",
            PipelineState::Validating(_) => "validating",
            PipelineState::AwaitingConfirmation(_) => "awaiting_confirmation",
            PipelineState::Signing(_) => "signing",
            PipelineState::Redacting { .. } => "redacting",
            PipelineState::Emitting { .. } => "emitting",
        }
    }
}

/// Signed, redacted, encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedExport {
    pub base64: String,
    pub signatures: usize,
}

#[derive(Debug)]
pub enum StepOutcome {
    /// Nothing running.
    Idle,
    /// Advanced or waiting; call again next tick.
    Pending,
    NeedsConfirmation(SpendSummary),
    Emitted(SignedExport),
    Cancelled,
    Declined,
    Failed(SignerError),
}

#[derive(Debug, Default)]
pub struct SigningPipeline {
    state: PipelineState,
}

impl SigningPipeline {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self) -> &PipelineState { &self.state }

    pub fn is_idle(&self) -> bool { self.state == PipelineState::Idle }

    /// Transaction awaiting the operator, if any.
    pub fn pending(&self) -> Option<&PendingTransaction> {
        match &self.state {
            PipelineState::AwaitingConfirmation(pending) => Some(pending),
            _ => None,
        }
    }

    /// Starts capture. Any previous run is abandoned.
    pub fn begin(&mut self, capture: &mut dyn CaptureDevice) -> SignerResult<()> {
        capture.stop();
        self.state = PipelineState::Idle;
        capture.start()?;
        self.state = PipelineState::Scanning;
        tracing::info!("signing: scanning");
        Ok(())
    }

    /// Skips capture for payloads that arrived by other means.
    pub fn begin_with_payload(&mut self, payload: impl Into<String>) {
        self.state = PipelineState::Parsing(payload.into());
    }

    /// Advances at most one state.
    pub fn tick(&mut self, session: &SessionState, capture: &mut dyn CaptureDevice) -> StepOutcome {
        let state = std::mem::take(&mut self.state);
        let from = state.name();
        let outcome = match self.step(state, session, capture) {
            Ok(outcome) => outcome,
            Err(e) => {
                capture.stop();
                self.state = PipelineState::Idle;
                tracing::warn!(state = from, error = %e, "signing aborted");
                StepOutcome::Failed(e)
            }
        };
        if self.state.name() != from {
            tracing::debug!(from, to = self.state.name(), "signing step");
        }
        outcome
    }

    fn step(&mut self, state: PipelineState, session: &SessionState, capture: &mut dyn CaptureDevice) -> SignerResult<StepOutcome> {
        match state {
            PipelineState::Idle => Ok(StepOutcome::Idle),

            PipelineState::Scanning => match capture.poll() {
                None => {
                    self.state = PipelineState::Scanning;
                    Ok(StepOutcome::Pending)
                }
                Some(Ok(payload)) => {
                    capture.stop();
                    self.state = PipelineState::Parsing(payload);
                    Ok(StepOutcome::Pending)
                }
                Some(Err(reason)) => Err(SignerError::InputCapture(reason)),
            },

            PipelineState::Parsing(payload) => {
                let psbt = decode(&payload)?;
                self.state = PipelineState::Validating(psbt);
                Ok(StepOutcome::Pending)
            }

            PipelineState::Validating(psbt) => {
                if !session.is_keyed() {
                    return Err(SignerError::not_keyed());
                }
                let pending = check_psbt(psbt, &session.wallets, session.network)?;
                let summary = pending.summary.clone();
                tracing::info!(wallet = %summary.wallet_name, fee = summary.fee.to_sat(), "signing: awaiting confirmation");
                self.state = PipelineState::AwaitingConfirmation(pending);
                Ok(StepOutcome::NeedsConfirmation(summary))
            }

            PipelineState::AwaitingConfirmation(pending) => {
                self.state = PipelineState::AwaitingConfirmation(pending);
                Ok(StepOutcome::Pending)
            }

            PipelineState::Signing(pending) => {
                let mut psbt = pending.psbt;
                let validated = psbt.unsigned_tx.clone();
                let signatures = session.keystore.sign(&mut psbt)?;
                if psbt.unsigned_tx != validated {
                    return Err(SignerError::Signing("transaction changed during signing".into()));
                }
                if signatures == 0 {
                    return Err(SignerError::Signing("no signatures produced".into()));
                }
                tracing::info!(signatures, "signing: signed");
                self.state = PipelineState::Redacting { psbt, signatures };
                Ok(StepOutcome::Pending)
            }

            PipelineState::Redacting { mut psbt, signatures } => {
                redact(&mut psbt);
                self.state = PipelineState::Emitting { psbt, signatures };
                Ok(StepOutcome::Pending)
            }

            PipelineState::Emitting { psbt, signatures } => {
                let base64 = encode(&psbt);
                tracing::info!(signatures, bytes = base64.len(), "signing: emitted");
                Ok(StepOutcome::Emitted(SignedExport { base64, signatures }))
            }
        }
    }

    /// Operator approved the summary. False if nothing was awaiting approval.
    pub fn confirm(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            PipelineState::AwaitingConfirmation(pending) => {
                tracing::info!("signing: confirmed");
                self.state = PipelineState::Signing(pending);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Operator said no. Drops the pending transaction.
    pub fn decline(&mut self, capture: &mut dyn CaptureDevice) -> StepOutcome {
        capture.stop();
        self.state = PipelineState::Idle;
        tracing::info!("signing: declined");
        StepOutcome::Declined
    }

    /// Operator backed out mid-workflow.
    pub fn cancel(&mut self, capture: &mut dyn CaptureDevice) -> StepOutcome {
        capture.stop();
        if !self.is_idle() {
            tracing::info!(state = self.state.name(), "signing: cancelled");
        }
        self.state = PipelineState::Idle;
        StepOutcome::Cancelled
    }
}
