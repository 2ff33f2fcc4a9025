// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! A cursor-tracking, length-clipped view over a rented segment.
//!
//! Unlike [`crate::facade::SegmentFacade`], which always addresses the
//! segment by an explicit offset, a `SegmentStream` keeps its own read/write
//! position and a logical `length` no caller may read past -- the
//! complement to writes, which silently grow `length` as they go.

use crate::error::{PoolError, Result};
use crate::facade::SegmentFacade;

/// A sequential view over a [`SegmentFacade`] with an implicit cursor.
pub struct SegmentStream {
    facade: SegmentFacade,
    position: usize,
    length: usize,
    capacity: usize,
}

impl SegmentStream {
    /// Wrap `facade` in a stream whose logical length starts at the
    /// segment's full capacity.
    pub fn new(facade: SegmentFacade, capacity: usize) -> Self {
        Self {
            facade,
            position: 0,
            length: capacity,
            capacity,
        }
    }

    /// Current read/write position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Logical length: bytes at or past this point read as EOF.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Set the logical length. Must lie within `[0, capacity]`.
    pub fn set_length(&mut self, length: usize) -> Result<()> {
        if length > self.capacity {
            return Err(PoolError::OutOfRange);
        }
        self.length = length;
        if self.position > self.length {
            self.position = self.length;
        }
        Ok(())
    }

    /// Move the cursor to `position`. Must lie within `[0, capacity]`;
    /// unlike `length`, the cursor may run ahead of the current length
    /// (a subsequent write there will grow it).
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.capacity {
            return Err(PoolError::OutOfRange);
        }
        self.position = position;
        Ok(())
    }

    /// Read from the current position, clipped to `length`. Returns the
    /// number of bytes actually copied into `buf`; zero at end-of-stream.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let available = self.length.saturating_sub(self.position);
        let to_read = buf.len().min(available);
        if to_read == 0 {
            return Ok(0);
        }

        let n = self
            .facade
            .read(self.position as u64, &mut buf[..to_read])?;
        self.position += n;
        Ok(n)
    }

    /// Write at the current position, clipped to `capacity`. Extends
    /// `length` to cover the write if it runs past the current length.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let available = self.capacity.saturating_sub(self.position);
        let to_write = buf.len().min(available);
        if to_write == 0 {
            return Ok(0);
        }

        self.facade
            .write(self.position as u64, &buf[..to_write])?;
        self.position += to_write;
        self.length = self.length.max(self.position);
        Ok(to_write)
    }

    /// No-op: every write already lands in the backing file synchronously.
    pub fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Reclaim the underlying facade, consuming the stream.
    pub fn into_facade(self) -> SegmentFacade {
        self.facade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolOptions;
    use crate::pool::SegmentPool;

    fn stream(segment_size: usize) -> (SegmentPool, SegmentStream) {
        let pool = SegmentPool::open_temp(PoolOptions::builder(segment_size).build()).unwrap();
        let facade = pool.rent().unwrap();
        (pool, SegmentStream::new(facade, segment_size))
    }

    #[test]
    fn fresh_stream_length_is_full_capacity() {
        let (_pool, s) = stream(16);
        assert_eq!(s.length(), 16);
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn write_then_read_back_from_start() {
        let (_pool, mut s) = stream(16);
        let written = s.write(&[1, 2, 3, 4]).unwrap();
        assert_eq!(written, 4);
        assert_eq!(s.position(), 4);

        s.seek(0).unwrap();
        let mut out = [0u8; 4];
        let n = s.read(&mut out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn read_past_length_yields_eof() {
        let (_pool, mut s) = stream(16);
        s.set_length(4).unwrap();
        s.seek(4).unwrap();
        let mut out = [0xFFu8; 4];
        let n = s.read(&mut out).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn write_past_length_extends_it_but_not_past_capacity() {
        let (_pool, mut s) = stream(8);
        s.set_length(0).unwrap();
        s.seek(4).unwrap();
        let n = s.write(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(n, 4, "write must clip at capacity");
        assert_eq!(s.length(), 8);
    }

    #[test]
    fn set_length_past_capacity_is_rejected() {
        let (_pool, mut s) = stream(8);
        let err = s.set_length(9).unwrap_err();
        assert!(matches!(err, crate::error::PoolError::OutOfRange));
    }

    #[test]
    fn shrinking_length_below_position_clamps_position() {
        let (_pool, mut s) = stream(16);
        s.seek(10).unwrap();
        s.set_length(4).unwrap();
        assert_eq!(s.position(), 4);
    }
}
