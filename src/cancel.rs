//! Cooperative cancellation for the in-flight analysis request.
//!
//! A [`CancellationToken`] is shared between whoever may cancel (the user,
//! a reset) and the pending request, which polls it. A [`CancelAffordance`]
//! reveals the cancel option only after a fixed delay so fast responses never
//! flash it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Delay before the cancel option is offered.
pub const DEFAULT_CANCEL_DELAY: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Timer that calls `on_show` once the delay elapses, unless dismissed first.
///
/// Dropping the affordance dismisses it.
pub struct CancelAffordance {
    dismiss: Option<Sender<()>>,
    timer: Option<JoinHandle<bool>>,
}

impl CancelAffordance {
    pub fn schedule<F>(delay: Duration, token: CancellationToken, on_show: F) -> Self
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        let timer = thread::spawn(move || match rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) if !token.is_cancelled() => {
                on_show(token);
                true
            }
            _ => false,
        });

        Self {
            dismiss: Some(tx),
            timer: Some(timer),
        }
    }

    /// Stop the timer. Returns whether the affordance had already been shown.
    pub fn dismiss(mut self) -> bool {
        if let Some(tx) = self.dismiss.take() {
            let _ = tx.send(());
        }
        self.timer
            .take()
            .map(|timer| timer.join().unwrap_or(false))
            .unwrap_or(false)
    }
}

impl Drop for CancelAffordance {
    fn drop(&mut self) {
        if let Some(tx) = self.dismiss.take() {
            let _ = tx.send(());
        }
    }
}
