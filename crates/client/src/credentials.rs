//! Round-robin pool of API credentials.
//!
//! Workers read the current credential before each call and report back
//! when that credential hit a rate limit. The pool index is advanced under
//! a single lock so that concurrent reports against the same credential
//! rotate the pool once.

use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::github::GitHubError;

/// A credential handed out by the rotator, tagged with its pool index.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub index: usize,
    token: String,
}

impl Credential {
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("index", &self.index).field("token", &"<redacted>").finish()
    }
}

/// What the rotator did with a rate-limit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// The pool moved on (or another worker already moved it); retry now.
    Rotated,
    /// Only one credential exists; the cooldown was slept under the lock.
    Stalled,
    /// Every credential was rotated past without a success in between.
    /// The caller must wait out the backoff before retrying.
    Exhausted,
}

#[derive(Debug)]
struct RotationState {
    index: usize,
    strikes: usize,
    /// End of the latest single-credential stall.
    stalled_until: Option<Instant>,
}

/// Thread-safe credential pool.
pub struct CredentialRotator {
    tokens: Vec<String>,
    state: Mutex<RotationState>,
}

impl fmt::Debug for CredentialRotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRotator").field("pool_size", &self.tokens.len()).finish()
    }
}

impl CredentialRotator {
    /// Build a rotator from a non-empty list of tokens.
    pub fn new(tokens: Vec<String>) -> Result<Self, GitHubError> {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(GitHubError::MissingCredentials);
        }
        Ok(Self { tokens, state: Mutex::new(RotationState { index: 0, strikes: 0, stalled_until: None }) })
    }

    pub fn pool_size(&self) -> usize {
        self.tokens.len()
    }

    /// The credential workers should use right now.
    ///
    /// Blocks while a single-credential cooldown is in progress.
    pub async fn current(&self) -> Credential {
        let state = self.state.lock().await;
        Credential { index: state.index, token: self.tokens[state.index].clone() }
    }

    /// Report that the credential at `failed_index` was rate limited.
    ///
    /// With a single credential this sleeps for `wait` while holding the
    /// lock, which stalls every caller of `current()` too. Reports made
    /// while a stall was running are covered by it and do not stall again.
    pub async fn report_rate_limited(&self, failed_index: usize, wait: Duration) -> Rotation {
        let reported_at = Instant::now();
        let mut state = self.state.lock().await;

        if self.tokens.len() == 1 {
            if let Some(until) = state.stalled_until.filter(|until| *until >= reported_at) {
                tokio::time::sleep_until(until).await;
                return Rotation::Stalled;
            }
            tracing::warn!(credential = 0, wait_secs = wait.as_secs(), "single credential rate limited, stalling");
            let until = Instant::now() + wait;
            state.stalled_until = Some(until);
            tokio::time::sleep_until(until).await;
            return Rotation::Stalled;
        }

        if state.index != failed_index {
            return Rotation::Rotated;
        }

        state.index = (state.index + 1) % self.tokens.len();
        state.strikes += 1;
        tracing::info!(from = failed_index, to = state.index, "rotated credential");

        if state.strikes >= self.tokens.len() {
            state.strikes = 0;
            tracing::warn!(pool_size = self.tokens.len(), "all credentials rate limited");
            return Rotation::Exhausted;
        }
        Rotation::Rotated
    }

    /// Report a successful call; clears the exhaustion counter.
    pub async fn report_success(&self, index: usize) {
        let mut state = self.state.lock().await;
        if state.index == index {
            state.strikes = 0;
        }
    }
}
