//! Channel - the capture/display collaborators the controller talks to.
//!
//! ```text
//! CaptureDevice (camera, QR decoder, simulator feed)
//!        │ poll() each tick
//!        ▼
//! WorkflowController ──► Screen (menus, prompts, QR, alerts)
//! ```
//!
//! Rendering, layout and image decoding live behind these traits.

use crate::controller::MenuItem;
use crate::error::SignerResult;
use crate::signing::SpendSummary;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Asynchronous payload source, polled once per tick.
pub trait CaptureDevice {
    fn start(&mut self) -> SignerResult<()>;
    /// `None` while still waiting, `Some(Err)` on a capture failure.
    fn poll(&mut self) -> Option<Result<String, String>>;
    /// Stops capture and discards partial input.
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

/// Display side. Implementations decide how things look.
pub trait Screen {
    fn show_menu(&mut self, title: &str, items: &[MenuItem]);
    fn show_error(&mut self, message: &str);
    fn show_alert(&mut self, title: &str, message: &str);
    /// Free-text entry (recovery phrase, password).
    fn show_prompt(&mut self, title: &str, note: &str);
    fn show_progress(&mut self, message: &str);
    fn show_qr(&mut self, title: &str, payload: &str);
    fn show_mnemonic(&mut self, phrase: &str, items: &[MenuItem]);
    fn show_candidates(&mut self, candidates: &[&str]);
    fn show_confirmation(&mut self, summary: &SpendSummary);
}

/// Feeds payloads into a [`QueuedCapture`] from elsewhere (stdin, tests).
#[derive(Debug, Clone)]
pub struct CaptureFeed {
    tx: Sender<Result<String, String>>,
}

impl CaptureFeed {
    pub fn scan(&self, payload: impl Into<String>) {
        self.send(Ok(payload.into()));
    }

    pub fn fail(&self, reason: impl Into<String>) {
        self.send(Err(reason.into()));
    }

    /// Returns false once the capture device is gone.
    fn send(&self, item: Result<String, String>) -> bool {
        match self.tx.send(item) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("capture device gone, payload dropped");
                false
            }
        }
    }
}

/// Capture device backed by a queue. Payloads arriving while inactive are dropped.
#[derive(Debug)]
pub struct QueuedCapture {
    rx: Receiver<Result<String, String>>,
    active: bool,
}

impl QueuedCapture {
    pub fn new() -> (Self, CaptureFeed) {
        let (tx, rx) = mpsc::channel();
        (Self { rx, active: false }, CaptureFeed { tx })
    }

    fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

impl CaptureDevice for QueuedCapture {
    fn start(&mut self) -> SignerResult<()> {
        self.drain();
        self.active = true;
        Ok(())
    }

    fn poll(&mut self) -> Option<Result<String, String>> {
        if !self.active {
            self.drain();
            return None;
        }
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err("capture source closed".into())),
        }
    }

    fn stop(&mut self) {
        self.active = false;
        self.drain();
    }

    fn is_active(&self) -> bool { self.active }
}
