//! Cooperative cancellation for the quadratic loops.
//!
//! A [`CancelToken`] is cheap to clone and share across threads. Long
//! computations call [`CancelToken::check`] between units of work (one
//! matrix row, one grid row) and bail out with a [`SpatialError`] once the
//! token is cancelled or its deadline passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::SpatialError;

/// Shared cancellation flag with an optional deadline.
///
/// Clones share the same flag, so cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that is never cancelled unless [`Self::cancel`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// A token that expires `timeout` from now. A timeout too large to
    /// represent never expires.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns an error if the token was cancelled or has expired.
    ///
    /// # Errors
    ///
    /// * [`SpatialError::Cancelled`] after [`Self::cancel`]
    /// * [`SpatialError::DeadlineExceeded`] once the deadline has passed
    pub fn check(&self) -> Result<(), SpatialError> {
        if self.is_cancelled() {
            return Err(SpatialError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(SpatialError::DeadlineExceeded);
        }
        Ok(())
    }
}
