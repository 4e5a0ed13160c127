//! Flattens an in-memory [`BucketTable`] into the two on-disk blobs
//! (postings + offsets) and reloads them for O(1) bucket lookups.
//!
//! The reload path zero-copy reinterprets the little-endian read buffer as
//! `&[u32]` via `bytemuck`, with an explicit byte-swapping fallback on
//! big-endian hosts.

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::bucket::BucketTable;
use crate::error::{IndexError, Result};

pub const SENTINEL: u32 = 0xFFFF_FFFF;

/// Sorts every bucket and writes the postings and offsets files.
///
/// Returns the number of buckets written (`2^B`), for use by callers that
/// want to cross-check against an expected bucket count.
pub fn serialize(
    table: BucketTable,
    postings_path: &Path,
    offsets_path: &Path,
) -> Result<usize> {
    let bucket_count = table.len();
    let sorted_buckets = table.into_sorted_buckets();

    let mut postings = BufWriter::new(File::create(postings_path)?);
    let mut offsets = BufWriter::new(File::create(offsets_path)?);

    let mut offset: u32 = 0;
    for positions in &sorted_buckets {
        offsets.write_u32::<LittleEndian>(offset)?;
        for &p in positions {
            postings.write_u32::<LittleEndian>(p)?;
        }
        if !positions.is_empty() {
            postings.write_u32::<LittleEndian>(SENTINEL)?;
        }
        let advance = positions.len() + if positions.is_empty() { 0 } else { 1 };
        offset = offset
            .checked_add(advance as u32)
            .ok_or_else(|| IndexError::InternalInvariant("postings offset overflowed u32".into()))?;
    }

    postings.flush()?;
    offsets.flush()?;
    Ok(bucket_count)
}

/// The two blobs loaded whole into memory, exposing O(1) bucket lookups.
pub struct BucketIndex {
    postings: Vec<u32>,
    offsets: Vec<u32>,
}

impl BucketIndex {
    /// Reads both blobs from disk.
    pub fn load(postings_path: &Path, offsets_path: &Path) -> Result<Self> {
        let postings = read_u32_blob(postings_path)?;
        let offsets = read_u32_blob(offsets_path)?;
        Ok(BucketIndex { postings, offsets })
    }

    /// Number of buckets (`2^B`), derived from the offsets word count.
    pub fn bucket_count(&self) -> usize {
        self.offsets.len()
    }

    /// Returns the sorted positions in bucket `i`, excluding the sentinel.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.bucket_count()`.
    pub fn get_bucket(&self, i: usize) -> &[u32] {
        let start = self.offsets[i] as usize;
        let end = if i + 1 < self.offsets.len() {
            self.offsets[i + 1] as usize
        } else {
            self.postings.len()
        };
        let span = &self.postings[start..end];
        match span.last() {
            Some(&SENTINEL) => &span[..span.len() - 1],
            _ => span,
        }
    }
}

fn read_u32_blob(path: &Path) -> Result<Vec<u32>> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IndexError::InputMissing(path.to_path_buf())
        } else {
            IndexError::OutputIOError(e)
        }
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(IndexError::OutputIOError)?;
    if bytes.len() % 4 != 0 {
        return Err(IndexError::InternalInvariant(format!(
            "{} is not a whole number of 32-bit words ({} bytes)",
            path.display(),
            bytes.len()
        )));
    }

    #[cfg(target_endian = "little")]
    {
        Ok(bytemuck::cast_slice::<u8, u32>(&bytes).to_vec())
    }
    #[cfg(not(target_endian = "little"))]
    {
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::index;

    fn roundtrip(genome: &[u8], bits: u32, threads: usize) -> (Vec<Vec<u32>>, BucketIndex) {
        let table = BucketTable::new(bits);
        index(genome, &table, threads);
        let expected: Vec<Vec<u32>> = {
            let check_table = BucketTable::new(bits);
            index(genome, &check_table, threads);
            check_table.into_sorted_buckets()
        };

        let dir = std::env::temp_dir().join(format!(
            "kindex-serialize-test-{}-{}",
            std::process::id(),
            bits
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let postings_path = dir.join("postings.idx");
        let offsets_path = dir.join("offsets.idx");

        serialize(table, &postings_path, &offsets_path).unwrap();
        let loaded = BucketIndex::load(&postings_path, &offsets_path).unwrap();

        std::fs::remove_file(&postings_path).ok();
        std::fs::remove_file(&offsets_path).ok();
        std::fs::remove_dir(&dir).ok();

        (expected, loaded)
    }

    #[test]
    fn round_trip_matches_in_memory_sort() {
        let genome = b"ACGTTGGCATTACAGGCTAGACCTTGGAACCTTAGGCATGCATCGATCGTAGCTAGCATCG";
        let (expected, loaded) = roundtrip(genome, 6, 4);
        assert_eq!(loaded.bucket_count(), 1 << 6);
        for (i, expected_bucket) in expected.iter().enumerate() {
            assert_eq!(loaded.get_bucket(i), expected_bucket.as_slice());
        }
    }

    #[test]
    fn sentinel_absent_for_empty_buckets() {
        // Small genome, large bucket table: guarantees several empty buckets.
        let genome = b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT";
        let table = BucketTable::new(10);
        index(genome, &table, 1);

        let dir = std::env::temp_dir().join(format!(
            "kindex-serialize-sentinel-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let postings_path = dir.join("postings.idx");
        let offsets_path = dir.join("offsets.idx");
        serialize(table, &postings_path, &offsets_path).unwrap();
        let loaded = BucketIndex::load(&postings_path, &offsets_path).unwrap();

        let mut saw_empty = false;
        for i in 0..loaded.bucket_count() {
            if loaded.get_bucket(i).is_empty() {
                saw_empty = true;
            }
            assert!(!loaded.get_bucket(i).contains(&SENTINEL));
        }
        assert!(saw_empty, "expected at least one empty bucket in this scenario");

        std::fs::remove_file(&postings_path).ok();
        std::fs::remove_file(&offsets_path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn output_is_byte_identical_across_thread_counts() {
        let genome = b"ACGTTGGCATTACAGGCTAGACCTTGGAACCTTAGGCATGCATCGATCGTAGCTAGCATCGACGTTGGCATTACAGGCTAG";
        let mut blobs = Vec::new();
        for threads in [1usize, 2, 8] {
            let table = BucketTable::new(7);
            index(genome, &table, threads);

            let dir = std::env::temp_dir().join(format!(
                "kindex-serialize-determinism-test-{}-{}",
                std::process::id(),
                threads
            ));
            std::fs::create_dir_all(&dir).unwrap();
            let postings_path = dir.join("postings.idx");
            let offsets_path = dir.join("offsets.idx");
            serialize(table, &postings_path, &offsets_path).unwrap();

            let postings_bytes = std::fs::read(&postings_path).unwrap();
            let offsets_bytes = std::fs::read(&offsets_path).unwrap();
            blobs.push((postings_bytes, offsets_bytes));

            std::fs::remove_file(&postings_path).ok();
            std::fs::remove_file(&offsets_path).ok();
            std::fs::remove_dir(&dir).ok();
        }
        for pair in blobs.windows(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }
}
