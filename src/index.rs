//! Parallel indexer: partitions the genome's valid starting positions
//! across worker threads, each running its own [`RollingKmer`].

use rayon::prelude::*;

use crate::bucket::BucketTable;
use crate::canonical::RollingKmer;
use crate::codec::KMER_LEN;
use crate::hash::murmur3_finalizer;

/// A contiguous, half-open range of valid starting positions assigned to
/// one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PositionRange {
    start: usize,
    end: usize,
}

/// Splits the `total` valid starting positions (`{0, ..., total-1}`) into
/// `threads` contiguous, non-overlapping ranges, the first `threads-1` of
/// size `total/threads` (floor) and the last absorbing the remainder.
///
/// Partitioning the position space directly (rather than the raw genome
/// byte length, as the original C++ chunking did) is what keeps this total
/// and thread-count independent: see the design note in the indexer
/// component of the write-up this crate follows.
fn partition_positions(total: usize, threads: usize) -> Vec<PositionRange> {
    if total == 0 || threads == 0 {
        return Vec::new();
    }
    let threads = threads.min(total).max(1);
    let chunk = total / threads;
    let mut ranges = Vec::with_capacity(threads);
    let mut start = 0usize;
    for i in 0..threads {
        let end = if i + 1 == threads { total } else { start + chunk };
        if end > start {
            ranges.push(PositionRange { start, end });
        }
        start = end;
    }
    ranges
}

/// Populates `buckets` with every valid 32-mer position in `genome`
/// exactly once, using up to `threads` worker threads.
///
/// `threads` is clamped to at least 1: a caller passing `0` still gets a
/// complete index (indexed single-threaded) rather than a silently empty
/// one, since this function's contract is to cover every valid position
/// regardless of the requested parallelism.
///
/// No-op if `genome.len() < 32`.
pub fn index(genome: &[u8], buckets: &BucketTable, threads: usize) {
    if genome.len() < KMER_LEN {
        return;
    }
    let threads = threads.max(1);
    let total_positions = genome.len() - KMER_LEN + 1;
    let ranges = partition_positions(total_positions, threads);

    ranges.into_par_iter().for_each(|range| {
        index_range(genome, range.start, range.end, buckets);
    });
}

fn index_range(genome: &[u8], start: usize, end: usize, buckets: &BucketTable) {
    if start >= end {
        return;
    }
    let mut roll = RollingKmer::new(&genome[start..start + KMER_LEN]);
    for p in start..end {
        let canonical = roll.slide(genome[p + KMER_LEN - 1]);
        let h = murmur3_finalizer(canonical);
        buckets.push(h, p as u32);
    }
}
