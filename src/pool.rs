// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pool lifecycle: construction, rent/return, and teardown.

use crate::backend::FileBackend;
use crate::config::PoolOptions;
use crate::error::{PoolError, Result};
use crate::facade::SegmentFacade;
use crate::freelist::FreeList;
use crate::handle::SegmentHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug)]
pub(crate) struct PoolInner {
    backend: RwLock<Option<FileBackend>>,
    pub(crate) max_segment_size: usize,
    pub(crate) zero_buffer: Option<Box<[u8]>>,
    free_list: FreeList,
    cursor: AtomicI64,
    disposed: AtomicBool,
}

impl PoolInner {
    pub(crate) fn is_clean_mode(&self) -> bool {
        self.zero_buffer.is_some()
    }

    /// Return `offset` to the free list; called by a disposing facade.
    pub(crate) fn release(&self, offset: u64) {
        self.free_list.push(offset);
    }

    /// Run `f` against the live backend, failing with
    /// [`PoolError::PoolDisposed`] once [`SegmentPool::dispose`] has taken
    /// and dropped it. Takes only a read lock, so concurrent I/O on
    /// distinct (or even the same) segment never serializes against
    /// anything but the kernel itself -- the write lock is reserved for
    /// `SegmentPool::dispose`, which takes the backend out exactly once.
    pub(crate) fn with_backend<R>(&self, f: impl FnOnce(&FileBackend) -> Result<R>) -> Result<R> {
        let guard = self.backend.read().unwrap_or_else(|poison| poison.into_inner());
        match guard.as_ref() {
            Some(backend) => f(backend),
            None => Err(PoolError::PoolDisposed),
        }
    }
}

/// A pool of fixed-size segments backed by a single exclusive file.
///
/// Cloning a `SegmentPool` is cheap and shares the same underlying state;
/// every clone sees the same free list, cursor, and disposed flag.
#[derive(Clone, Debug)]
pub struct SegmentPool {
    inner: Arc<PoolInner>,
}

impl SegmentPool {
    /// Open a pool at `path` with the given options.
    pub fn open(path: impl AsRef<Path>, opts: PoolOptions) -> Result<Self> {
        if opts.max_segment_size == 0 {
            return Err(PoolError::OutOfRange);
        }

        let (backend, zero_buffer) = FileBackend::open(path.as_ref(), &opts)?;

        let inner = Arc::new(PoolInner {
            backend: RwLock::new(Some(backend)),
            max_segment_size: opts.max_segment_size,
            zero_buffer,
            free_list: FreeList::new(),
            cursor: AtomicI64::new(-(opts.max_segment_size as i64)),
            disposed: AtomicBool::new(false),
        });

        log::info!(
            "segment pool opened: segment_size={} clean_mode={}",
            opts.max_segment_size,
            inner.is_clean_mode()
        );

        Ok(Self { inner })
    }

    /// Open a pool backed by a uniquely-named file in the OS temp
    /// directory. Convenient for scratch caches and tests.
    pub fn open_temp(opts: PoolOptions) -> Result<Self> {
        Self::open(Self::unique_temp_path(), opts)
    }

    fn unique_temp_path() -> PathBuf {
        use std::time::{SystemTime, UNIX_EPOCH};

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("segpool-{}-{nanos}", std::process::id()))
    }

    /// Rent a segment. Fails with [`PoolError::PoolDisposed`] once the pool
    /// has been (or is being) torn down.
    pub fn rent(&self) -> Result<SegmentFacade> {
        if self.inner.disposed.load(Ordering::Acquire) {
            return Err(PoolError::PoolDisposed);
        }

        let offset = match self.inner.free_list.pop() {
            Some(offset) => offset,
            None => self.bump_cursor(),
        };

        log::debug!("segment rented: offset={offset}");
        let handle = SegmentHandle::new_in_use(offset);
        Ok(SegmentFacade::new(Arc::downgrade(&self.inner), handle))
    }

    fn bump_cursor(&self) -> u64 {
        let step = self.inner.max_segment_size as i64;
        let previous = self.inner.cursor.fetch_add(step, Ordering::AcqRel);
        debug_assert!(
            previous.checked_add(step).is_some(),
            "cursor overflowed representable offset range"
        );
        (previous + step) as u64
    }

    /// Best-effort, racily-observed number of segments currently on the
    /// free list. Diagnostic only; never treat this as ground truth for
    /// how many segments are actually outstanding.
    pub fn returned_segment_count(&self) -> usize {
        self.inner.free_list.len_racy()
    }

    /// Fixed size of every segment handed out by this pool.
    pub fn max_segment_size(&self) -> usize {
        self.inner.max_segment_size
    }

    /// Tear the pool down: closes (and thereby deletes) the backing file
    /// immediately and empties the free list. Any facade still held by a
    /// caller fails all further I/O with [`PoolError::PoolDisposed`].
    ///
    /// Idempotent: a second call observes the flag already set and does
    /// nothing.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Taking the backend out and dropping it here -- rather than
        // waiting for the last `Arc<PoolInner>` clone to go away -- closes
        // the delete-on-close file deterministically at the moment of
        // disposal, not whenever the last facade happens to be dropped.
        let backend = self
            .inner
            .backend
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .take();
        drop(backend);

        self.inner.free_list.clear();
        log::info!("segment pool disposed");
    }
}
