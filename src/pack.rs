//! FASTA pack pre-pass: strips descriptor lines and newlines, drops
//! ambiguous `N`/`n` bases, and records where each record's sequence
//! begins in the packed genome blob.
//!
//! Grounded in `original_source/packGenomeBlob.cpp::packGenome`, re-derived
//! from scratch rather than built on a streaming multi-record FASTA reader:
//! this pre-pass needs one flattened byte blob plus a header-offset map,
//! not per-record streaming.

use crate::error::{IndexError, Result};

/// One FASTA descriptor line, keyed by the packed-genome offset of the
/// first base of its sequence.
pub struct HeaderEntry {
    pub offset: u64,
    /// The descriptor line as it appeared in the source file, including
    /// the leading `>` and excluding the line terminator.
    pub descriptor: String,
}

/// Result of packing a raw FASTA byte stream.
pub struct PackedGenome {
    pub genome: Vec<u8>,
    pub headers: Vec<HeaderEntry>,
}

/// Packs raw FASTA bytes into a flattened `A/C/G/T`-only genome blob plus
/// its header-offset map.
///
/// Descriptor lines (`>...`), `\r`, `\n`, and ambiguous `N`/`n` bases are
/// stripped; lowercase `a/c/g/t` are uppercased. Any other byte is
/// rejected as [`IndexError::InputMalformed`], naming the offending byte
/// and its offset in the source file.
pub fn pack_fasta(raw: &[u8]) -> Result<PackedGenome> {
    let mut genome = Vec::with_capacity(raw.len());
    let mut headers = Vec::new();

    let mut i = 0usize;
    while i < raw.len() {
        let b = raw[i];
        if b == b'>' {
            let line_start = i;
            let mut j = i;
            while j < raw.len() && raw[j] != b'\n' {
                j += 1;
            }
            let line_end = if j < raw.len() && j > line_start && raw[j - 1] == b'\r' {
                j - 1
            } else {
                j
            };
            let descriptor = std::str::from_utf8(&raw[line_start..line_end])
                .map_err(|_| {
                    IndexError::InputMalformed(format!(
                        "descriptor line at offset {} is not valid UTF-8",
                        line_start
                    ))
                })?
                .to_string();
            headers.push(HeaderEntry {
                offset: genome.len() as u64,
                descriptor,
            });
            i = if j < raw.len() { j + 1 } else { j };
            continue;
        }
        match b {
            b'\n' | b'\r' | b'N' | b'n' => {}
            b'A' | b'C' | b'G' | b'T' => genome.push(b),
            b'a' | b'c' | b'g' | b't' => genome.push(b.to_ascii_uppercase()),
            other => {
                return Err(IndexError::InputMalformed(format!(
                    "byte 0x{:02x} at offset {} is not A/C/G/T/N/>/newline",
                    other, i
                )));
            }
        }
        i += 1;
    }

    Ok(PackedGenome { genome, headers })
}
