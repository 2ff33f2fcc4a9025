// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cooperative cancellation for async segment I/O.
//!
//! A [`CancellationToken`] carries a boolean "is cancelled" flag plus
//! callback registration (via [`tokio::sync::Notify`]). Cancellation is
//! only honored at the boundary of an async call, never mid-kernel-I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cheaply cloneable cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<Inner>);

impl CancellationToken {
    /// Create a fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation, waking anyone awaiting [`Self::cancelled`].
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::Release);
        self.0.notify.notify_waiters();
    }

    /// True once [`Self::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.0.notify.notified().await;
    }
}
