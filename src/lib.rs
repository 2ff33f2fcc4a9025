// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Segment Pool
//!
//! A lock-free pool of fixed-size segments carved out of a single exclusive
//! backing file, intended as the storage substrate under a random-access
//! cache or write-ahead log.
//!
//! # Features
//!
//! - **Lock-free reuse** -- released offsets go onto an epoch-reclaimed
//!   Treiber stack; first-time allocation is a single atomic bump.
//! - **Delete-on-close backing file** -- the file never appears in the
//!   directory once opened; its space reclaims automatically on teardown.
//! - **Sync and async facades** -- the same segment can be driven with
//!   blocking calls or, via `SegmentFacade::*_async`, off the async
//!   runtime's worker pool with cooperative cancellation.
//! - **Stream view** -- `SegmentStream` layers a cursor and a logical
//!   length on top of a facade for sequential access patterns.
//!
//! # Architecture
//!
//! ```text
//! SegmentPool
//! +-- FileBackend   (positional read/write/erase against one file)
//! +-- FreeList      (lock-free stack of released offsets)
//! +-- SegmentHandle (per-rental disposal latch)
//! +-- SegmentFacade (caller-facing read/write/dispose, sync + async)
//! +-- SegmentStream (cursor + logical length over a facade)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use segpool::{PoolOptions, SegmentPool};
//!
//! let pool = SegmentPool::open_temp(PoolOptions::builder(4096).build())?;
//! let segment = pool.rent()?;
//! segment.write(0, b"hello")?;
//!
//! let mut out = [0u8; 5];
//! segment.read(0, &mut out)?;
//! assert_eq!(&out, b"hello");
//!
//! segment.dispose()?;
//! pool.dispose();
//! # Ok::<(), segpool::PoolError>(())
//! ```

mod backend;
pub mod cancel;
pub mod config;
pub mod error;
pub mod facade;
mod freelist;
mod handle;
pub mod pool;
pub mod stream;

pub use cancel::CancellationToken;
pub use config::{PoolOptions, PoolOptionsBuilder};
pub use error::{PoolError, Result};
pub use facade::SegmentFacade;
pub use pool::SegmentPool;
pub use stream::SegmentStream;
