//! Stdin line router.
//!
//! A background thread owns stdin. While an analysis is pending and its
//! cancel option has been offered, the next line (usually a bare Enter)
//! cancels the request instead of reaching the shell.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;

use colored::Colorize;

use crate::cancel::CancellationToken;

/// Shared slot holding the token a line should cancel, if any.
#[derive(Debug, Clone, Default)]
pub struct CancelArm {
    target: Arc<Mutex<Option<CancellationToken>>>,
}

impl CancelArm {
    pub fn arm(&self, token: CancellationToken) {
        if let Ok(mut slot) = self.target.lock() {
            *slot = Some(token);
        }
    }

    pub fn disarm(&self) {
        if let Ok(mut slot) = self.target.lock() {
            *slot = None;
        }
    }

    /// Cancel and disarm. Returns false when nothing was armed.
    pub fn fire(&self) -> bool {
        let token = self.target.lock().ok().and_then(|mut slot| slot.take());
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Callback for [`crate::session::Session::start_analysis`]: print the
    /// hint and arm the token.
    pub fn offer(&self) -> impl FnOnce(CancellationToken) + Send + 'static {
        let arm = self.clone();
        move |token| {
            eprintln!(
                "{}",
                "Still analyzing… press Enter to cancel.".yellow()
            );
            arm.arm(token);
        }
    }
}

pub struct LineInput {
    lines: Receiver<String>,
    arm: CancelArm,
}

impl LineInput {
    /// Start the stdin reader thread.
    pub fn spawn() -> Self {
        let arm = CancelArm::default();
        let (tx, rx) = mpsc::channel();
        let router = arm.clone();

        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines().map_while(Result::ok) {
                if router.fire() {
                    continue;
                }
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Self { lines: rx, arm }
    }

    pub fn cancel_arm(&self) -> CancelArm {
        self.arm.clone()
    }

    /// Prompt and wait for the next line. `None` at end of input.
    pub fn read_line(&self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = io::stdout().flush();
        self.lines.recv().ok()
    }

    /// Drop lines typed while a request was pending.
    pub fn discard_pending(&self) -> usize {
        self.lines.try_iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_cancels_only_when_armed() {
        let arm = CancelArm::default();
        assert!(!arm.fire());

        let token = CancellationToken::new();
        arm.arm(token.clone());
        assert!(arm.fire());
        assert!(token.is_cancelled());
        assert!(!arm.fire());
    }

    #[test]
    fn disarm_leaves_token_alone() {
        let arm = CancelArm::default();
        let token = CancellationToken::new();
        arm.arm(token.clone());
        arm.disarm();
        assert!(!arm.fire());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn offer_arms_the_given_token() {
        let arm = CancelArm::default();
        let token = CancellationToken::new();
        (arm.offer())(token.clone());
        assert!(arm.fire());
        assert!(token.is_cancelled());
    }
}
