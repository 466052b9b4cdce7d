//! Cancellation of running checks
//!
//! A canceller hands out watch receivers to probe workers. Workers check the
//! flag before starting a probe and race in-flight probes against it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Cancellation handle shared by a check and whoever may stop it
#[derive(Clone)]
pub struct CheckCanceller {
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
    cancelled: Arc<AtomicBool>,
}

impl CheckCanceller {
    pub fn new() -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);

        Self {
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a receiver for the cancellation signal
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.cancel_rx.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation; repeated calls are no-ops
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Cancelling running check");
        let _ = self.cancel_tx.send(true);
    }

    /// Cancel on Ctrl+C
    pub fn cancel_on_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let canceller = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C");
                canceller.cancel();
            }
        })
    }
}

impl Default for CheckCanceller {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once `rx` observes cancellation. Never resolves if the sender is
/// dropped without cancelling.
pub async fn cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        let is_cancelled = *rx.borrow_and_update();
        if is_cancelled {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
