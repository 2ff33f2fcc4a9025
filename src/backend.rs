// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Positional I/O against the pool's single backing file.
//!
//! All operations address the file by absolute offset; there is no shared
//! file cursor, so concurrent calls are safe (the kernel serializes
//! positional I/O per descriptor). Platform-specific open flags live
//! behind `cfg(unix)` / `cfg(windows)` blocks: one thin, heavily
//! `SAFETY`-commented `unsafe` boundary per platform primitive, with every
//! failure path funneled into a typed [`PoolError`].

use crate::config::PoolOptions;
use crate::error::{PoolError, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// The pool's single backing file, opened for exclusive positional I/O.
#[derive(Debug)]
pub(crate) struct FileBackend {
    file: File,
}

impl FileBackend {
    /// Open (and, on success, unlink) the backing file per `opts`.
    ///
    /// Returns the backend plus the clean-mode zero buffer, if any.
    pub(crate) fn open(path: &Path, opts: &PoolOptions) -> Result<(Self, Option<Box<[u8]>>)> {
        let file = open_exclusive(path, opts)?;

        apply_random_access_advice(&file);
        #[cfg(target_os = "linux")]
        apply_fadvise_noreuse(&file);

        if opts.do_not_clean {
            let total = opts.preallocated_segments() as u64 * opts.max_segment_size as u64;
            file.set_len(total)?;
        }

        // Delete-on-close on Unix: the name is removed from the directory
        // immediately, but the inode (and its data) lives on until every
        // open descriptor -- including this one -- closes.
        #[cfg(unix)]
        unlink_now(path)?;

        let zero_buffer = if opts.do_not_clean {
            None
        } else {
            Some(vec![0u8; opts.max_segment_size].into_boxed_slice())
        };

        Ok((Self { file }, zero_buffer))
    }

    /// Write `buf` at `offset`, looping over partial writes.
    pub(crate) fn write(&self, offset: u64, buf: &[u8]) -> Result<()> {
        write_at(&self.file, offset, buf)
    }

    /// Read into `buf` at `offset`; returns the number of bytes actually
    /// delivered by the OS, which may be less than `buf.len()`.
    pub(crate) fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        read_at(&self.file, offset, buf)
    }

    /// Overwrite the region at `offset` with `zero_buffer`.
    pub(crate) fn erase(&self, offset: u64, zero_buffer: &[u8]) -> Result<()> {
        self.write(offset, zero_buffer)
    }
}

#[cfg(unix)]
fn open_exclusive(path: &Path, opts: &PoolOptions) -> Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options.read(true).write(true).create_new(true);

    // Write-through: every write is durable (to the extent the platform
    // promises) before the call returns. `async_io` additionally requests
    // the kernel's direct/async I/O path where available.
    let mut custom_flags = libc::O_SYNC;
    if opts.async_io {
        custom_flags |= libc::O_DIRECT;
    }
    options.custom_flags(custom_flags);

    options.open(path).map_err(PoolError::Io)
}

#[cfg(unix)]
fn unlink_now(path: &Path) -> Result<()> {
    use std::ffi::CString;

    let c_path = CString::new(path.as_os_str().as_encoded_bytes())
        .map_err(|_| PoolError::Io(std::io::Error::from(std::io::ErrorKind::InvalidInput)))?;
    // SAFETY: `c_path` is a valid NUL-terminated path derived from `path`.
    // Unlinking a file that is still open is well-defined on POSIX
    // filesystems: the name disappears, the inode is reclaimed once the
    // last descriptor referencing it closes.
    let ret = unsafe { libc::unlink(c_path.as_ptr()) };
    if ret != 0 {
        return Err(PoolError::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(unix)]
fn apply_random_access_advice(file: &File) {
    use std::os::unix::io::AsRawFd;

    // SAFETY: `file` owns a valid descriptor for the duration of this
    // call. `posix_fadvise` never invalidates the descriptor; its return
    // value is advisory and failures are safe to ignore.
    let ret = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_RANDOM) };
    if ret != 0 {
        log::debug!("posix_fadvise(POSIX_FADV_RANDOM) failed: errno {ret}");
    }
}

#[cfg(target_os = "linux")]
fn apply_fadvise_noreuse(file: &File) {
    use std::os::unix::io::AsRawFd;

    // SAFETY: same contract as `apply_random_access_advice` above; this
    // hint is purely advisory and best-effort per design (§4.1).
    let ret = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_NOREUSE) };
    debug_assert!(
        ret == 0 || ret == libc::ENOSYS,
        "posix_fadvise(POSIX_FADV_NOREUSE) failed unexpectedly: errno {ret}"
    );
}

#[cfg(unix)]
fn write_at(file: &File, offset: u64, buf: &[u8]) -> Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset).map_err(PoolError::Io)
}

#[cfg(unix)]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset).map_err(PoolError::Io)
}

#[cfg(windows)]
fn open_exclusive(path: &Path, opts: &PoolOptions) -> Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    use windows_sys::Win32::Storage::FileSystem::{
        FILE_FLAG_DELETE_ON_CLOSE, FILE_FLAG_RANDOM_ACCESS, FILE_FLAG_WRITE_THROUGH,
    };

    let mut flags = FILE_FLAG_DELETE_ON_CLOSE | FILE_FLAG_WRITE_THROUGH | FILE_FLAG_RANDOM_ACCESS;
    if opts.async_io {
        // Overlapped I/O is requested through the same custom-flags path;
        // the synchronous calls below still complete immediately for a
        // local, non-overlapped-opened handle on most filesystems.
        flags |= windows_sys::Win32::Storage::FileSystem::FILE_FLAG_OVERLAPPED;
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .custom_flags(flags)
        .open(path)
        .map_err(PoolError::Io)
}

#[cfg(windows)]
fn write_at(file: &File, offset: u64, buf: &[u8]) -> Result<()> {
    use std::os::windows::fs::FileExt;

    let mut written = 0usize;
    while written < buf.len() {
        let n = file.seek_write(&buf[written..], offset + written as u64)?;
        if n == 0 {
            return Err(PoolError::Io(std::io::Error::from(
                std::io::ErrorKind::WriteZero,
            )));
        }
        written += n;
    }
    Ok(())
}

#[cfg(windows)]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset).map_err(PoolError::Io)
}
