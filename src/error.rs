// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pool error taxonomy.

use thiserror::Error;

/// Errors produced by the segment pool, its facades, and its streams.
#[derive(Debug, Error)]
pub enum PoolError {
    /// An offset or length argument fell outside `[0, max_segment_size]`,
    /// or `max_segment_size` itself was not a positive integer.
    #[error("out of range")]
    OutOfRange,

    /// The operation targeted a facade whose pool has been torn down, or
    /// `rent` was called after teardown began.
    #[error("pool disposed")]
    PoolDisposed,

    /// The operation targeted a facade that has already been disposed.
    #[error("segment disposed")]
    SegmentDisposed,

    /// An I/O error propagated unchanged from the file backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cancellation was observed before kernel entry.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PoolError>;
