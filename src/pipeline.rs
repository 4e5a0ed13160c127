//! Orchestrates pack -> index -> serialize -> (optional) verify, and
//! derives the four output file paths from an input FASTA path.
//!
//! Progress is reported via `println!` milestones (matching
//! `original_source/main.cpp`'s percent-complete style) rather than
//! silently.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::bucket::BucketTable;
use crate::codec::KMER_LEN;
use crate::error::{IndexError, Result};
use crate::index::index;
use crate::pack::pack_fasta;
use crate::serialize::{serialize, BucketIndex};

/// 4 GB: the input-size cap enforced before reading a reference FASTA.
const MAX_INPUT_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// The four output paths for a given input basename and output directory.
pub struct OutputPaths {
    pub genome: PathBuf,
    pub header_map: PathBuf,
    pub postings: PathBuf,
    pub offsets: PathBuf,
}

/// Derives the output basename by stripping everything from the input
/// file's first `.` onward, then builds the four suffixed output paths
/// inside `output_dir`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use kindex::pipeline::output_paths;
/// let paths = output_paths(Path::new("/data/hg38.fa"), Path::new("/out"));
/// assert_eq!(paths.genome, Path::new("/out/hg38_genome.idx"));
/// assert_eq!(paths.header_map, Path::new("/out/hg38_refID.idx"));
/// assert_eq!(paths.postings, Path::new("/out/hg38_32_InnerBlob.idx"));
/// assert_eq!(paths.offsets, Path::new("/out/hg38_32_OuterBlob.idx"));
/// ```
pub fn output_paths(input: &Path, output_dir: &Path) -> OutputPaths {
    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let base = match filename.find('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    };
    OutputPaths {
        genome: output_dir.join(format!("{}_genome.idx", base)),
        header_map: output_dir.join(format!("{}_refID.idx", base)),
        postings: output_dir.join(format!("{}_32_InnerBlob.idx", base)),
        offsets: output_dir.join(format!("{}_32_OuterBlob.idx", base)),
    }
}

/// Picks `B = ceil(log2(genome_len))`, capped at 32. Returns 1 for genomes
/// of length 0 or 1, since a bucket table needs at least one addressable
/// bit.
pub fn choose_bucket_bits(genome_len: usize) -> u32 {
    if genome_len <= 1 {
        return 1;
    }
    let bits = (usize::BITS - (genome_len - 1).leading_zeros()).max(1);
    bits.min(32)
}

/// Runs the full pipeline: read `input`, pack, index, serialize, write the
/// genome blob and header map, and (if `verify`) reload the postings and
/// offsets files to check they describe the same bucket contents the
/// in-memory index produced.
pub fn run(
    input: &Path,
    output_dir: &Path,
    threads: usize,
    verify: bool,
) -> Result<()> {
    let metadata = fs::metadata(input).map_err(|_| IndexError::InputMissing(input.to_path_buf()))?;
    if metadata.len() > MAX_INPUT_BYTES {
        return Err(IndexError::InputMissing(input.to_path_buf()));
    }
    let raw = fs::read(input).map_err(|_| IndexError::InputMissing(input.to_path_buf()))?;
    println!("loaded {} ({} bytes)", input.display(), raw.len());

    let packed = pack_fasta(&raw)?;
    println!(
        "packed genome: {} bases, {} records",
        packed.genome.len(),
        packed.headers.len()
    );

    let bits = choose_bucket_bits(packed.genome.len());
    let bucket_count = 1usize << bits;
    println!("bucket table: B={} ({} buckets)", bits, bucket_count);

    let table = BucketTable::new(bits);
    let start = Instant::now();
    index(&packed.genome, &table, threads);
    println!("indexing done in {:?} ({} threads)", start.elapsed(), threads);

    let paths = output_paths(input, output_dir);
    fs::write(&paths.genome, &packed.genome)?;

    let mut header_text = String::new();
    for entry in &packed.headers {
        header_text.push_str(&format!("{} {}\n", entry.offset, entry.descriptor));
    }
    fs::write(&paths.header_map, header_text)?;

    let start = Instant::now();
    serialize(table, &paths.postings, &paths.offsets)?;
    println!("serialization done in {:?}", start.elapsed());

    if verify {
        let loaded = BucketIndex::load(&paths.postings, &paths.offsets)?;
        if loaded.bucket_count() != bucket_count {
            return Err(IndexError::InternalInvariant(format!(
                "reloaded bucket count {} does not match expected {}",
                loaded.bucket_count(),
                bucket_count
            )));
        }
        let expected_postings = packed.genome.len().saturating_sub(KMER_LEN - 1);
        let total_postings: usize = (0..loaded.bucket_count())
            .map(|i| loaded.get_bucket(i).len())
            .sum();
        if total_postings != expected_postings {
            return Err(IndexError::InternalInvariant(format!(
                "reloaded index holds {} postings, expected {} (genome length {})",
                total_postings,
                expected_postings,
                packed.genome.len()
            )));
        }
        println!(
            "verification ok: {} buckets reloaded, {} postings",
            loaded.bucket_count(),
            total_postings
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_strip_from_first_dot() {
        let paths = output_paths(Path::new("genome.fasta.gz"), Path::new("/out"));
        assert_eq!(paths.genome, Path::new("/out/genome_genome.idx"));
        assert_eq!(paths.header_map, Path::new("/out/genome_refID.idx"));
    }

    #[test]
    fn bucket_bits_matches_ceil_log2() {
        assert_eq!(choose_bucket_bits(40), 6); // ceil(log2(40)) == 6
        assert_eq!(choose_bucket_bits(64), 6);
        assert_eq!(choose_bucket_bits(65), 7);
        assert_eq!(choose_bucket_bits(1), 1);
        assert_eq!(choose_bucket_bits(0), 1);
    }

    #[test]
    fn end_to_end_pipeline_round_trip() {
        let dir = std::env::temp_dir().join(format!(
            "kindex-pipeline-test-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("toy.fasta");
        fs::write(&input, b">toy\nACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT\n").unwrap();

        run(&input, &dir, 2, true).unwrap();

        let paths = output_paths(&input, &dir);
        assert!(paths.genome.exists());
        assert!(paths.header_map.exists());
        assert!(paths.postings.exists());
        assert!(paths.offsets.exists());

        let genome_bytes = fs::read(&paths.genome).unwrap();
        assert_eq!(genome_bytes.len(), 40);

        fs::remove_dir_all(&dir).ok();
    }

    /// `threads = 0` must still produce a complete, verifying index rather
    /// than a pipeline that reports success over an empty one.
    #[test]
    fn zero_threads_still_produces_a_complete_verified_index() {
        let dir = std::env::temp_dir().join(format!(
            "kindex-pipeline-zero-threads-test-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("toy.fasta");
        fs::write(&input, b">toy\nACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT\n").unwrap();

        run(&input, &dir, 0, true).unwrap();

        let paths = output_paths(&input, &dir);
        let loaded = BucketIndex::load(&paths.postings, &paths.offsets).unwrap();
        let total_postings: usize = (0..loaded.bucket_count())
            .map(|i| loaded.get_bucket(i).len())
            .sum();
        assert_eq!(total_postings, 9); // 40-base genome: 9 valid 32-mer positions

        fs::remove_dir_all(&dir).ok();
    }
}
