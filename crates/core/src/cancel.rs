//! Cancellation tokens for subprocess chains
//!
//! A [`CancelToken`] is threaded through every provisioning tool and hook
//! invocation so the caller can abort mid-chain. The shell executor polls
//! the token while a child process runs and kills the process when the
//! token trips.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, untripped token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token; observers will see it on their next poll
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been tripped
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
