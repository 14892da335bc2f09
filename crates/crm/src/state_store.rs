//! Pending OAuth `state` values awaiting their callback.
//!
//! A value is issued when the user is sent to amoCRM and consumed when the
//! callback comes back carrying it. Each value is accepted at most once and
//! only within the configured TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::Mutex;

/// Number of random bytes in a state value (hex-encoded to twice this).
const STATE_BYTES: usize = 16;
/// Default upper bound on outstanding state values.
const DEFAULT_MAX_PENDING: usize = 10_000;

pub struct OAuthStateStore {
    ttl: Duration,
    max_pending: usize,
    pending: Mutex<HashMap<String, Instant>>,
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_limit(ttl, DEFAULT_MAX_PENDING)
    }

    /// Store holding at most `max_pending` outstanding values. Once full,
    /// issuing a new value evicts the oldest one.
    pub fn with_limit(ttl: Duration, max_pending: usize) -> Self {
        Self {
            ttl,
            max_pending: max_pending.max(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Generate a fresh state value and remember it.
    pub async fn issue(&self) -> String {
        let state = generate_state();
        let mut pending = self.pending.lock().await;
        let ttl = self.ttl;
        pending.retain(|_, issued_at| issued_at.elapsed() < ttl);

        while pending.len() >= self.max_pending {
            let Some(oldest) = pending
                .iter()
                .min_by_key(|(_, issued_at)| **issued_at)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            pending.remove(&oldest);
            tracing::debug!("OAuth state store full, evicted oldest pending state");
        }

        pending.insert(state.clone(), Instant::now());
        state
    }

    /// Remove `state` from the pending set. Returns `true` only if it was
    /// issued by this store and has not expired.
    pub async fn consume(&self, state: &str) -> bool {
        let mut pending = self.pending.lock().await;
        match pending.remove(state) {
            Some(issued_at) => issued_at.elapsed() < self.ttl,
            None => false,
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// 16 random bytes as lowercase hex.
pub fn generate_state() -> String {
    let bytes: [u8; STATE_BYTES] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
