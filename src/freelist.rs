// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lock-free Treiber stack of released segment offsets.
//!
//! Every `push` allocates a brand-new node, so a node popped off the stack
//! can never reappear with the same identity — the classic ABA window is
//! closed without tagged pointers. Safe reclamation of popped nodes is
//! handled by `crossbeam`'s epoch-based garbage collector rather than
//! hazard pointers.

use crossbeam::epoch::{self, Atomic, Owned, Shared};
use std::sync::atomic::Ordering;

struct Node {
    offset: u64,
    next: Atomic<Node>,
}

/// Stack of segment offsets available for immediate reuse.
#[derive(Default, Debug)]
pub(crate) struct FreeList {
    head: Atomic<Node>,
}

impl FreeList {
    pub(crate) fn new() -> Self {
        Self {
            head: Atomic::null(),
        }
    }

    /// Push `offset` onto the stack.
    pub(crate) fn push(&self, offset: u64) {
        let guard = &epoch::pin();
        let mut node = Owned::new(Node {
            offset,
            next: Atomic::null(),
        });
        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            node.next.store(head, Ordering::Relaxed);
            match self
                .head
                .compare_exchange(head, node, Ordering::Release, Ordering::Relaxed, guard)
            {
                Ok(_) => return,
                Err(e) => node = e.new,
            }
        }
    }

    /// Pop an offset, if the stack is non-empty.
    pub(crate) fn pop(&self) -> Option<u64> {
        let guard = &epoch::pin();
        loop {
            let head: Shared<'_, Node> = self.head.load(Ordering::Acquire, guard);
            // SAFETY: `head` was loaded from `self.head` under the current
            // epoch guard; it is either null or points to a node that
            // cannot be reclaimed while this guard is pinned.
            let node = unsafe { head.as_ref() }?;
            let next = node.next.load(Ordering::Relaxed, guard);
            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                let offset = node.offset;
                // SAFETY: the CAS above unlinked `head` from the stack, so
                // this call is the sole owner of it going forward.
                unsafe {
                    guard.defer_destroy(head);
                }
                return Some(offset);
            }
        }
    }

    /// Drain every entry currently on the stack. Used at pool teardown;
    /// safe to call concurrently with `push`/`pop`, though anything
    /// pushed concurrently with the drain may or may not be observed.
    pub(crate) fn clear(&self) {
        while self.pop().is_some() {}
    }

    /// Best-effort, racily-observed count of entries currently on the
    /// stack. Diagnostic only, per design: never a source of truth.
    pub(crate) fn len_racy(&self) -> usize {
        let guard = &epoch::pin();
        let mut count = 0;
        let mut current = self.head.load(Ordering::Relaxed, guard);
        // SAFETY: nodes visited here are pinned for the duration of this
        // traversal by `guard`; the walk may race with concurrent
        // push/pop and under- or over-count, which is the documented
        // contract for this diagnostic.
        while let Some(node) = unsafe { current.as_ref() } {
            count += 1;
            current = node.next.load(Ordering::Relaxed, guard);
        }
        count
    }
}

impl Drop for FreeList {
    fn drop(&mut self) {
        // The pool is being torn down and no other thread can observe
        // `self` concurrently, so an unguarded walk that frees every
        // remaining node is sound.
        let guard = &epoch::pin();
        let mut current = self.head.swap(Shared::null(), Ordering::AcqRel, guard);
        while !current.is_null() {
            // SAFETY: `self` has exclusive access (we're in `Drop`) and
            // each node is owned exactly once by the list being torn down.
            let next = unsafe {
                let owned = current.into_owned();
                owned.next.load(Ordering::Relaxed, guard)
            };
            current = next;
        }
    }
}
