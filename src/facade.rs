// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The caller-facing handle to a rented segment.
//!
//! A `SegmentFacade` holds a weak reference to the pool rather than a
//! strong one: a facade must never keep the pool -- and therefore its
//! backing file -- alive past the pool's own disposal.

use crate::cancel::CancellationToken;
use crate::error::{PoolError, Result};
use crate::handle::SegmentHandle;
use crate::pool::PoolInner;
use std::sync::{Arc, Weak};

/// A rented, fixed-size window into the pool's backing file.
#[derive(Debug)]
pub struct SegmentFacade {
    pool: Weak<PoolInner>,
    handle: Arc<SegmentHandle>,
}

impl SegmentFacade {
    pub(crate) fn new(pool: Weak<PoolInner>, handle: Arc<SegmentHandle>) -> Self {
        Self { pool, handle }
    }

    /// The segment's byte offset within the pool's backing file.
    pub fn offset(&self) -> u64 {
        self.handle.offset()
    }

    /// Synchronously write `buf` at `offset` within this segment.
    pub fn write(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let pool = self.check_usable()?;
        self.check_bounds(&pool, offset, buf.len())?;
        pool.with_backend(|backend| backend.write(self.handle.offset() + offset, buf))
    }

    /// Synchronously read into `buf` at `offset` within this segment.
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let pool = self.check_usable()?;
        self.check_bounds(&pool, offset, buf.len())?;
        pool.with_backend(|backend| backend.read(self.handle.offset() + offset, buf))
    }

    /// Asynchronously write `buf` at `offset`, honoring `token` before the
    /// blocking kernel call is dispatched. Cancellation already in flight
    /// is never interrupted; it is only ever observed at the boundary.
    pub async fn write_async(
        &self,
        offset: u64,
        buf: Vec<u8>,
        token: &CancellationToken,
    ) -> Result<()> {
        if token.is_cancelled() {
            return Err(PoolError::Cancelled);
        }
        let pool = self.check_usable()?;
        self.check_bounds(&pool, offset, buf.len())?;
        let absolute = self.handle.offset() + offset;

        tokio::task::spawn_blocking(move || pool.with_backend(|backend| backend.write(absolute, &buf)))
            .await
            .map_err(|_| PoolError::Cancelled)?
    }

    /// Asynchronously read `buf.len()` bytes at `offset`, copying the
    /// result back into `buf` once the blocking read completes.
    pub async fn read_async(
        &self,
        offset: u64,
        buf: &mut [u8],
        token: &CancellationToken,
    ) -> Result<usize> {
        if token.is_cancelled() {
            return Err(PoolError::Cancelled);
        }
        let pool = self.check_usable()?;
        self.check_bounds(&pool, offset, buf.len())?;
        let absolute = self.handle.offset() + offset;
        let len = buf.len();

        let (owned, n) = tokio::task::spawn_blocking(move || -> Result<(Vec<u8>, usize)> {
            let mut owned = vec![0u8; len];
            let n = pool.with_backend(|backend| backend.read(absolute, &mut owned))?;
            Ok((owned, n))
        })
        .await
        .map_err(|_| PoolError::Cancelled)??;

        buf[..n].copy_from_slice(&owned[..n]);
        Ok(n)
    }

    /// Release this segment back to the pool. In clean mode the segment is
    /// zero-filled first, best-effort: the offset is returned to the free
    /// list regardless of whether the erase succeeds, since a future
    /// renter will either get a zeroed segment or overwrite it wholesale
    /// before trusting its contents. Idempotent.
    pub fn dispose(&self) -> Result<()> {
        if !self.handle.mark_disposed() {
            return Ok(());
        }
        let Some(pool) = self.pool.upgrade() else {
            return Ok(());
        };

        if let Some(zero_buffer) = pool.zero_buffer.as_deref() {
            let offset = self.handle.offset();
            if let Err(err) = pool.with_backend(|backend| backend.erase(offset, zero_buffer)) {
                log::warn!("segment erase failed during dispose: offset={offset} err={err}");
            }
        }

        pool.release(self.handle.offset());
        Ok(())
    }

    /// Async counterpart of [`Self::dispose`]; the erase runs on a blocking
    /// thread but the offset return and idempotence check are synchronous.
    pub async fn dispose_async(&self, token: &CancellationToken) -> Result<()> {
        if !self.handle.mark_disposed() {
            return Ok(());
        }
        let Some(pool) = self.pool.upgrade() else {
            return Ok(());
        };

        if token.is_cancelled() {
            pool.release(self.handle.offset());
            return Err(PoolError::Cancelled);
        }

        if let Some(zero_buffer) = pool.zero_buffer.clone() {
            let offset = self.handle.offset();
            let erase_pool = Arc::clone(&pool);
            let result = tokio::task::spawn_blocking(move || {
                erase_pool.with_backend(|backend| backend.erase(offset, &zero_buffer))
            })
            .await;
            if !matches!(result, Ok(Ok(()))) {
                log::warn!("segment erase failed during async dispose: offset={offset}");
            }
        }

        pool.release(self.handle.offset());
        Ok(())
    }

    /// Upgrade the weak pool reference and confirm neither the pool nor
    /// this segment has already been disposed.
    fn check_usable(&self) -> Result<Arc<PoolInner>> {
        if self.handle.is_disposed() {
            return Err(PoolError::SegmentDisposed);
        }
        self.pool.upgrade().ok_or(PoolError::PoolDisposed)
    }

    fn check_bounds(&self, pool: &PoolInner, offset: u64, len: usize) -> Result<()> {
        let end = offset.checked_add(len as u64).ok_or(PoolError::OutOfRange)?;
        if end > pool.max_segment_size as u64 {
            return Err(PoolError::OutOfRange);
        }
        Ok(())
    }
}
