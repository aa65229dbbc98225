use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::RwLock;

use crate::transport::ApiClient;

const CODE_LEN: usize = 6;

/// Where the pairing flow currently stands. Derived from the state fields
/// plus the session store; never stored directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingPhase {
    /// 0-5 digits entered.
    Entering,
    /// 6 digits entered, not yet submitted.
    Complete,
    /// Submitted, awaiting the network.
    Verifying,
    /// The session store is authenticated; callers navigate away.
    Verified,
    /// Verification failed; code cleared, error set, ready for re-entry.
    Rejected,
}

#[derive(Debug, Clone, Default)]
pub struct PairingState {
    pub code: String,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl PairingState {
    /// Replaces the code with the digits of `raw`, capped at six. Filtering
    /// depends only on the input, never on prior state. Entering anything
    /// non-empty clears a previous rejection message.
    pub fn set_code(&mut self, raw: &str) {
        self.code = raw
            .chars()
            .filter(char::is_ascii_digit)
            .take(CODE_LEN)
            .collect();
        if !self.code.is_empty() {
            self.error_message = None;
        }
    }

    #[must_use]
    pub fn is_code_complete(&self) -> bool {
        self.code.len() == CODE_LEN
    }

    /// Digit at `index`, or `None` past the entered length.
    #[must_use]
    pub fn digit_at(&self, index: usize) -> Option<char> {
        self.code.chars().nth(index)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Drives 6-digit code entry and exchanges a complete code for a session.
#[derive(Clone)]
pub struct PairingController {
    client: ApiClient,
    state: Arc<RwLock<PairingState>>,
    version: Arc<AtomicU64>,
}

impl PairingController {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(PairingState::default())),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn snapshot(&self) -> PairingState {
        self.state.read().await.clone()
    }

    /// Monotonic change counter; poll it to learn when to re-read the
    /// snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub async fn set_code(&self, raw: &str) {
        self.state.write().await.set_code(raw);
        self.bump();
    }

    pub async fn is_code_complete(&self) -> bool {
        self.state.read().await.is_code_complete()
    }

    pub async fn digit_at(&self, index: usize) -> Option<char> {
        self.state.read().await.digit_at(index)
    }

    pub async fn phase(&self) -> PairingPhase {
        let state = self.snapshot().await;
        if state.is_loading {
            return PairingPhase::Verifying;
        }
        if self.client.sessions().is_authenticated().await {
            return PairingPhase::Verified;
        }
        if state.error_message.is_some() {
            return PairingPhase::Rejected;
        }
        if state.is_code_complete() {
            PairingPhase::Complete
        } else {
            PairingPhase::Entering
        }
    }

    /// Submits the entered code. Returns immediately unless six digits are
    /// present. On success the session store is populated; on failure the
    /// code is cleared for full re-entry and the error surfaced. Callers
    /// issue at most one `verify` at a time.
    pub async fn verify(&self) {
        let code = {
            let mut state = self.state.write().await;
            if !state.is_code_complete() {
                return;
            }
            state.is_loading = true;
            state.error_message = None;
            state.code.clone()
        };
        self.bump();

        let result = self.client.verify_pairing_code(&code).await;

        let mut state = self.state.write().await;
        if let Err(error) = result {
            state.error_message = Some(error.to_string());
            state.code.clear();
        }
        state.is_loading = false;
        drop(state);
        self.bump();
    }

    pub async fn reset(&self) {
        self.state.write().await.reset();
        self.bump();
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::Release);
    }
}
