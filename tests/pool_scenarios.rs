// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end pool scenarios exercised through the public API only.

use segpool::cancel::CancellationToken;
use segpool::error::PoolError;
use segpool::pool::SegmentPool;
use segpool::stream::SegmentStream;
use segpool::PoolOptions;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
#[cfg(unix)]
fn opening_at_an_explicit_path_deletes_the_directory_entry_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pool.seg");

    let pool = SegmentPool::open(&path, PoolOptions::builder(64).build()).unwrap();
    assert!(!path.exists(), "backing file must be unlinked right after open");

    let segment = pool.rent().unwrap();
    segment.write(0, b"gone from the directory").unwrap();
    let mut out = [0u8; 23];
    segment.read(0, &mut out).unwrap();
    assert_eq!(&out, b"gone from the directory");

    segment.dispose().unwrap();
    pool.dispose();
}

#[test]
fn basic_rent_read_back_and_reuse_after_dispose() {
    let pool = SegmentPool::open_temp(PoolOptions::builder(256).build()).unwrap();

    let first = pool.rent().unwrap();
    first.write(0, b"segment zero").unwrap();
    let offset = first.offset();
    first.dispose().unwrap();

    let second = pool.rent().unwrap();
    assert_eq!(second.offset(), offset, "disposed offset must be reused");

    // Clean mode erases on dispose, so the reused segment reads back zeroed.
    let mut out = [0u8; 12];
    second.read(0, &mut out).unwrap();
    assert_eq!(out, [0u8; 12]);

    pool.dispose();
}

#[test]
fn preallocated_mode_skips_erase_on_dispose() {
    let opts = PoolOptions::builder(64)
        .do_not_clean(true)
        .expected_segments(4)
        .build();
    let pool = SegmentPool::open_temp(opts).unwrap();

    let first = pool.rent().unwrap();
    first.write(0, b"stays after dispose").unwrap();
    let offset = first.offset();
    first.dispose().unwrap();

    let second = pool.rent().unwrap();
    assert_eq!(second.offset(), offset);

    let mut out = [0u8; 19];
    second.read(0, &mut out).unwrap();
    assert_eq!(&out, b"stays after dispose");

    pool.dispose();
}

#[test]
fn out_of_range_access_is_rejected_but_segment_stays_usable() {
    let pool = SegmentPool::open_temp(PoolOptions::builder(16).build()).unwrap();
    let segment = pool.rent().unwrap();

    let err = segment.write(10, &[0u8; 10]).unwrap_err();
    assert!(matches!(err, PoolError::OutOfRange));

    // A rejected out-of-range write must not poison the segment.
    segment.write(0, b"still fine").unwrap();
    let mut out = [0u8; 10];
    segment.read(0, &mut out).unwrap();
    assert_eq!(&out, b"still fine");

    pool.dispose();
}

#[test]
fn disposed_segment_fails_cleanly_and_double_dispose_is_a_no_op() {
    let pool = SegmentPool::open_temp(PoolOptions::builder(16).build()).unwrap();
    let segment = pool.rent().unwrap();
    segment.dispose().unwrap();
    segment.dispose().unwrap();

    let err = segment.write(0, &[1]).unwrap_err();
    assert!(matches!(err, PoolError::SegmentDisposed));

    assert_eq!(pool.returned_segment_count(), 1, "only released once");
    pool.dispose();
}

#[test]
fn concurrent_rent_and_dispose_never_hands_out_two_live_copies_of_an_offset() {
    let pool = SegmentPool::open_temp(PoolOptions::builder(32).build()).unwrap();
    let live = Arc::new(std::sync::Mutex::new(HashSet::new()));
    let workers = 32;
    let cycles = 10_000;

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let pool = pool.clone();
            let live = Arc::clone(&live);
            thread::spawn(move || {
                for _ in 0..cycles {
                    let segment = pool.rent().unwrap();
                    let offset = segment.offset();
                    assert!(
                        live.lock().unwrap().insert(offset),
                        "offset {offset} handed out while still live elsewhere"
                    );

                    segment.write(0, &[1]).unwrap();
                    segment.dispose().unwrap();
                    live.lock().unwrap().remove(&offset);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    pool.dispose();
}

#[test]
fn stream_length_semantics_clip_reads_and_extend_on_write() {
    let pool = SegmentPool::open_temp(PoolOptions::builder(32).build()).unwrap();
    let segment = pool.rent().unwrap();
    let mut stream = SegmentStream::new(segment, 32);

    assert_eq!(stream.length(), 32);
    stream.set_length(0).unwrap();

    let written = stream.write(b"abcd").unwrap();
    assert_eq!(written, 4);
    assert_eq!(stream.length(), 4, "write past length must extend it");

    stream.seek(0).unwrap();
    let mut out = [0xFFu8; 8];
    let n = stream.read(&mut out).unwrap();
    assert_eq!(n, 4, "read must clip to the logical length, not capacity");
    assert_eq!(&out[..4], b"abcd");

    let n = stream.read(&mut out).unwrap();
    assert_eq!(n, 0, "reading at end of length yields EOF");

    let facade = stream.into_facade();
    facade.dispose().unwrap();
    pool.dispose();
}

#[tokio::test]
async fn async_io_round_trips_and_honors_cancellation_at_the_boundary() {
    let pool = SegmentPool::open_temp(PoolOptions::builder(64).build()).unwrap();
    let segment = pool.rent().unwrap();
    let token = CancellationToken::new();

    segment
        .write_async(0, b"async payload".to_vec(), &token)
        .await
        .unwrap();

    let mut out = [0u8; 13];
    let n = segment.read_async(0, &mut out, &token).await.unwrap();
    assert_eq!(n, 13);
    assert_eq!(&out, b"async payload");

    token.cancel();
    let err = segment
        .write_async(0, vec![1, 2, 3], &token)
        .await
        .unwrap_err();
    assert!(matches!(err, PoolError::Cancelled));

    pool.dispose();
}
