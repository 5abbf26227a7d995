//! Connection approval prompts.
//!
//! The approval step stands in for a browser extension's popup: a component
//! the session does not control decides whether the connection goes ahead.

use std::io::{BufRead, BufReader, Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use devwallet_core::Pubkey;

/// What the user is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    /// Provider asking for approval.
    pub provider: String,
    /// Account that would be exposed to the session.
    pub account: Pubkey,
}

#[async_trait]
pub trait Approval: Send + Sync {
    /// Returns `true` if the user approved.
    async fn approve(&self, request: &ApprovalRequest) -> bool;
}

/// Answers every request the same way. Used for unattended runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedApproval {
    approve: bool,
}

impl FixedApproval {
    pub fn allow() -> Self {
        Self { approve: true }
    }

    pub fn deny() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl Approval for FixedApproval {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        debug!(provider = %request.provider, account = %request.account.short(), approve = self.approve, "Fixed approval");
        self.approve
    }
}

/// Asks on the controlling terminal: `Approve connection of <addr>? [y/N]`.
///
/// Anything but `y`/`yes` is a rejection, and so is silence past `timeout`.
/// Input is read line by line on one detached thread for the lifetime of the
/// approver, so an unanswered prompt never leaves a read behind that could
/// swallow the answer to the next one.
#[derive(Debug, Clone)]
pub struct TerminalApproval {
    timeout: Duration,
    answers: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl TerminalApproval {
    /// Prompt on stderr and read answers from stdin.
    pub fn new(timeout: Duration) -> Self {
        Self::with_input(std::io::stdin(), timeout)
    }

    /// Read answers from `input` instead of stdin.
    pub fn with_input<R: Read + Send + 'static>(input: R, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = thread::Builder::new()
            .name("approval-input".into())
            .spawn(move || {
                for line in BufReader::new(input).lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Approval input closed");
                            break;
                        }
                    }
                }
            });
        if let Err(e) = spawned {
            // Sender is gone with the closure; every prompt will reject.
            warn!(error = %e, "Failed to start approval input reader");
        }
        Self {
            timeout,
            answers: Arc::new(Mutex::new(rx)),
        }
    }
}

impl Default for TerminalApproval {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

/// Interpret a prompt answer.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl Approval for TerminalApproval {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        let mut answers = self.answers.lock().await;

        // Lines typed while no prompt was showing do not answer this one.
        let mut stale = 0usize;
        while answers.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!(lines = stale, "Discarded input typed before the prompt");
        }

        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "[{}] Approve connection of {} to devwallet? [y/N] ",
            request.provider, request.account
        );
        let _ = stderr.flush();

        match tokio::time::timeout(self.timeout, answers.recv()).await {
            Ok(Some(line)) => is_affirmative(&line),
            Ok(None) => {
                warn!("Approval input is closed");
                false
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Approval prompt timed out");
                false
            }
        }
    }
}
