// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Segment Pool demo CLI
//!
//! Exercises a pool end to end: rent a run of segments, stamp each with a
//! recognizable pattern, read it back, dispose them, and report the
//! pool's racy free-list diagnostic.
//!
//! # Usage
//!
//! ```bash
//! segpool --path /tmp/segpool.bin --segment-size 4096 --count 8
//!
//! # Preallocated (no zero-fill on dispose), sized for 64 live segments
//! segpool --do-not-clean --expected-segments 64
//! ```

use clap::Parser;
use segpool::{PoolOptions, PoolError, SegmentPool};

#[derive(Parser, Debug)]
#[command(name = "segpool")]
#[command(about = "Segment pool demo: rent, stamp, verify, dispose", long_about = None)]
struct Args {
    /// Backing file path. Left unset, a unique temp-directory path is used.
    #[arg(short, long)]
    path: Option<String>,

    /// Fixed size of every segment, in bytes.
    #[arg(short, long, default_value_t = 4096)]
    segment_size: usize,

    /// Number of segments to rent in this run.
    #[arg(short, long, default_value_t = 4)]
    count: usize,

    /// Open the backing file with the platform's asynchronous I/O flag.
    #[arg(long)]
    async_io: bool,

    /// Preallocate the file instead of zero-filling segments on dispose.
    #[arg(long)]
    do_not_clean: bool,

    /// Expected number of live segments; sizes the preallocation.
    #[arg(long, default_value_t = 1)]
    expected_segments: i64,
}

fn main() -> Result<(), PoolError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let opts = PoolOptions::builder(args.segment_size)
        .async_io(args.async_io)
        .do_not_clean(args.do_not_clean)
        .expected_segments(args.expected_segments)
        .build();

    let pool = match &args.path {
        Some(path) => SegmentPool::open(path, opts)?,
        None => SegmentPool::open_temp(opts)?,
    };

    log::info!(
        "pool opened: segment_size={} count={}",
        args.segment_size,
        args.count
    );

    let mut segments = Vec::with_capacity(args.count);
    for i in 0..args.count {
        let segment = pool.rent()?;
        let pattern = vec![(i % 256) as u8; args.segment_size.min(64)];
        segment.write(0, &pattern)?;
        println!("rented segment {i}: offset={}", segment.offset());
        segments.push((segment, pattern));
    }

    for (i, (segment, pattern)) in segments.iter().enumerate() {
        let mut out = vec![0u8; pattern.len()];
        segment.read(0, &mut out)?;
        if out != *pattern {
            eprintln!("segment {i} readback mismatch!");
        }
    }

    for (segment, _) in segments {
        segment.dispose()?;
    }

    println!(
        "done: {} segments returned to the free list",
        pool.returned_segment_count()
    );
    pool.dispose();

    Ok(())
}
