use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error taxonomy for the indexing pipeline.
///
/// Kept as a plain enum rather than pulled in through `thiserror`/`anyhow`:
/// the four variants map directly onto the points of failure the pipeline
/// actually has, and `main` only needs `Display` + a process exit code.
#[derive(Debug)]
pub enum IndexError {
    /// The reference FASTA (or another required input) does not exist.
    InputMissing(PathBuf),
    /// The reference FASTA exists but contains bytes the pack pre-pass
    /// cannot interpret, or the genome is shorter than one window.
    InputMalformed(String),
    /// Writing one of the four output blobs failed.
    OutputIOError(io::Error),
    /// An invariant the pipeline itself is responsible for upholding
    /// did not hold (e.g. a bucket offset table disagreeing with its
    /// postings blob). Indicates a bug, not a bad input.
    InternalInvariant(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::InputMissing(path) => {
                write!(f, "required input not found: {}", path.display())
            }
            IndexError::InputMalformed(msg) => write!(f, "malformed input: {}", msg),
            IndexError::OutputIOError(err) => write!(f, "failed to write output: {}", err),
            IndexError::InternalInvariant(msg) => write!(f, "internal invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::OutputIOError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for IndexError {
    fn from(err: io::Error) -> Self {
        IndexError::OutputIOError(err)
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
