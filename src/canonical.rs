//! Rolling canonicalizer: maintains the forward and reverse-complement
//! packings of a sliding 32-base window so each slide costs O(1) instead of
//! a full re-pack.

use crate::codec::{encode, pack32, reverse_complement32, KMER_LEN};

/// Sliding-window canonical k-mer generator.
///
/// Construct with the genome region a worker owns and the position within
/// it (relative or absolute, the caller's choice) to start at; each call to
/// [`RollingKmer::slide`] advances the window by exactly one base and
/// returns the new canonical key.
pub struct RollingKmer {
    fwd: u64,
    rev: u64,
}

impl RollingKmer {
    /// Initializes the canonicalizer from the first 32-base window of
    /// `start_window`.
    ///
    /// # Panics
    ///
    /// Panics if `start_window.len() != 32`.
    pub fn new(start_window: &[u8]) -> Self {
        assert_eq!(start_window.len(), KMER_LEN);
        let fwd = pack32(start_window);
        let rev = reverse_complement32(fwd);
        RollingKmer {
            fwd: fwd >> 2,
            rev: rev << 2,
        }
    }

    /// Slides the window in by one base and returns the canonical key for
    /// the resulting 32-mer.
    #[inline]
    pub fn slide(&mut self, next_base: u8) -> u64 {
        let code = encode(next_base);
        self.fwd = (self.fwd << 2) | code;
        self.rev = (self.rev >> 2) | ((!code & 0b11) << 62);
        self.fwd ^ self.rev
    }

    /// The packed forward 32-mer as of the last slide (or initialization).
    pub fn forward(&self) -> u64 {
        self.fwd
    }
}
