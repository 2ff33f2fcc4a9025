// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Segment pool configuration.

/// Construction-time options for a [`crate::pool::SegmentPool`].
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Fixed size of every segment, in bytes. Must be positive.
    pub max_segment_size: usize,

    /// Open the backing file with the platform's asynchronous I/O flag.
    pub async_io: bool,

    /// Disable zero-fill on release and preallocate the file instead.
    pub do_not_clean: bool,

    /// Expected number of live segments. Only meaningful when
    /// `do_not_clean` is set; defaults to 1 when `<= 0`.
    pub expected_segments: i64,
}

impl PoolOptions {
    /// Start a builder seeded with clean-mode defaults for the given
    /// segment size.
    pub fn builder(max_segment_size: usize) -> PoolOptionsBuilder {
        PoolOptionsBuilder {
            max_segment_size,
            async_io: None,
            do_not_clean: None,
            expected_segments: None,
        }
    }

    pub(crate) fn preallocated_segments(&self) -> i64 {
        if self.expected_segments <= 0 {
            1
        } else {
            self.expected_segments
        }
    }
}

/// Fluent builder for [`PoolOptions`].
#[derive(Debug, Default)]
pub struct PoolOptionsBuilder {
    max_segment_size: usize,
    async_io: Option<bool>,
    do_not_clean: Option<bool>,
    expected_segments: Option<i64>,
}

impl PoolOptionsBuilder {
    /// Open the backing file with the platform's asynchronous I/O flag.
    pub fn async_io(mut self, enabled: bool) -> Self {
        self.async_io = Some(enabled);
        self
    }

    /// Disable zero-fill on release and preallocate by `expected_segments`.
    pub fn do_not_clean(mut self, enabled: bool) -> Self {
        self.do_not_clean = Some(enabled);
        self
    }

    /// Expected number of live segments (preallocated-mode sizing hint).
    pub fn expected_segments(mut self, count: i64) -> Self {
        self.expected_segments = Some(count);
        self
    }

    /// Build the final options.
    pub fn build(self) -> PoolOptions {
        PoolOptions {
            max_segment_size: self.max_segment_size,
            async_io: self.async_io.unwrap_or(false),
            do_not_clean: self.do_not_clean.unwrap_or(false),
            expected_segments: self.expected_segments.unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_clean_mode() {
        let opts = PoolOptions::builder(4096).build();
        assert_eq!(opts.max_segment_size, 4096);
        assert!(!opts.do_not_clean);
        assert!(!opts.async_io);
        assert_eq!(opts.preallocated_segments(), 1);
    }

    #[test]
    fn builder_sets_preallocated_mode() {
        let opts = PoolOptions::builder(8)
            .do_not_clean(true)
            .expected_segments(2)
            .build();
        assert!(opts.do_not_clean);
        assert_eq!(opts.preallocated_segments(), 2);
    }

    #[test]
    fn non_positive_expected_segments_defaults_to_one() {
        let opts = PoolOptions::builder(8)
            .do_not_clean(true)
            .expected_segments(0)
            .build();
        assert_eq!(opts.preallocated_segments(), 1);

        let opts = PoolOptions::builder(8)
            .do_not_clean(true)
            .expected_segments(-5)
            .build();
        assert_eq!(opts.preallocated_segments(), 1);
    }
}
