//! Per-bucket append-only position lists, guarded by a one-bit spinlock.
//!
//! The original indexer subclassed `std::vector<uint32_t>` to attach a
//! lock (`protected_vector<T> : public std::vector<T>`). Rust has no
//! analogous vector-subclassing, and inheriting the standard `Vec` API
//! wholesale would let a caller bypass the lock by reaching for `Vec`
//! methods directly anyway. [`Bucket`] instead wraps a `Vec<u32>` and
//! exposes exactly one mutating entry point while shared (`push`), so the
//! lock invariant is enforced at the type boundary rather than by
//! convention.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// A single bucket's position list plus its spinlock.
pub struct Bucket {
    lock: AtomicU32,
    positions: UnsafeCell<Vec<u32>>,
}

// SAFETY: all shared (`&self`) mutation goes through `push`, which only
// touches `positions` while holding the spinlock; no two threads ever
// dereference the `UnsafeCell` concurrently. Exclusive (`&mut self`)
// access (`sort`, `into_inner`) requires the caller to already hold the
// only reference, which Rust's borrow checker enforces independently of
// this impl.
unsafe impl Sync for Bucket {}

impl Bucket {
    fn new() -> Self {
        Bucket {
            lock: AtomicU32::new(UNLOCKED),
            positions: UnsafeCell::new(Vec::new()),
        }
    }

    /// Appends `position`, spinning on the bucket's lock until acquired.
    #[inline]
    pub fn push(&self, position: u32) {
        while self
            .lock
            .compare_exchange_weak(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        // SAFETY: lock held exclusively by this thread until the release store below.
        unsafe {
            (*self.positions.get()).push(position);
        }
        self.lock.store(UNLOCKED, Ordering::Release);
    }

    /// Number of positions currently stored. Racy if called while other
    /// threads may still `push`; intended for use after indexing completes.
    pub fn len(&self) -> usize {
        unsafe { (*self.positions.get()).len() }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorts the bucket's positions in place and returns them, consuming
    /// the bucket. Requires exclusive access, so no lock is needed here.
    pub fn into_sorted(self) -> Vec<u32> {
        let mut positions = self.positions.into_inner();
        positions.sort_unstable();
        positions
    }
}

/// `2^bits` buckets, indexed by the low `bits` bits of a hashed canonical
/// key.
pub struct BucketTable {
    buckets: Vec<Bucket>,
    mask: u32,
}

impl BucketTable {
    /// Allocates `2^bits` empty buckets. `bits` must be in `1..=32`.
    pub fn new(bits: u32) -> Self {
        assert!(bits >= 1 && bits <= 32, "bucket bits must be in 1..=32");
        let count = 1usize << bits;
        let mut buckets = Vec::with_capacity(count);
        buckets.resize_with(count, Bucket::new);
        let mask = if bits == 32 {
            u32::MAX
        } else {
            (1u32 << bits) - 1
        };
        BucketTable { buckets, mask }
    }

    /// Mask to apply to a 32-bit hash to obtain a bucket index.
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Number of buckets (`2^bits`).
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Appends `position` to the bucket selected by the low bits of `hash`.
    #[inline]
    pub fn push(&self, hash: u32, position: u32) {
        let idx = (hash & self.mask) as usize;
        self.buckets[idx].push(position);
    }

    pub fn bucket(&self, idx: usize) -> &Bucket {
        &self.buckets[idx]
    }

    /// Consumes the table, returning each bucket's sorted positions in
    /// bucket-index order.
    pub fn into_sorted_buckets(self) -> Vec<Vec<u32>> {
        self.buckets.into_iter().map(Bucket::into_sorted).collect()
    }
}
