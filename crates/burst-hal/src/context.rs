//! Per-call read context carrying a cancellation signal.
//!
//! A [`ReadContext`] is cheap to clone and is passed by reference into every
//! source read.  The paired [`CancelHandle`] flips the signal; any read that
//! is raced against the context through [`ReadContext::run`] then resolves
//! to [`CloudError::Cancelled`].

use std::future::Future;

use burst_types::CloudError;
use tokio::sync::watch;

/// Cancellation-aware context for source reads.
#[derive(Debug, Clone, Default)]
pub struct ReadContext {
    cancel: Option<watch::Receiver<bool>>,
}

/// Fires the cancellation signal of the [`ReadContext`] it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel every read running under the paired context.  Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl ReadContext {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context plus the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel: Some(rx) }, CancelHandle { tx })
    }

    /// `true` once the paired handle has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves when the context is cancelled; never resolves for a
    /// background context or once the handle is dropped uncancelled.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancel else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    /// Drive `fut` to completion unless the context is cancelled first.
    ///
    /// # Errors
    ///
    /// [`CloudError::Cancelled`] if cancellation wins the race, otherwise
    /// whatever `fut` returns.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, CloudError>
    where
        F: Future<Output = Result<T, CloudError>>,
    {
        if self.is_cancelled() {
            return Err(CloudError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(CloudError::Cancelled),
            result = fut => result,
        }
    }
}
