//! A parallel, low-memory 32-mer canonical k-mer indexer for whole
//! genomes: given a FASTA reference, builds a hash-bucketed index mapping
//! every strand-agnostic 32-mer to the positions at which it occurs.

pub mod bucket;
pub mod canonical;
pub mod codec;
pub mod error;
pub mod hash;
pub mod index;
pub mod pack;
pub mod pipeline;
pub mod serialize;
