//! Cooperative cancellation for long batch operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable cancellation flag.
///
/// Analysis and synthesis check the token at per-frame / per-partial
/// granularity and abort with [`Error::Cancelled`](crate::Error::Cancelled),
/// leaving their target untouched. Cloning shares the flag, so one token can
/// be handed to a worker while the owner keeps the ability to cancel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation. All clones observe the flag.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once [`CancelToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
