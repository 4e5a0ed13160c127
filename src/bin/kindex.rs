use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about = "Build a parallel 32-mer canonical k-mer index from a FASTA reference",
    long_about = "Build a parallel 32-mer canonical k-mer index from a FASTA reference.
Emits four files alongside (or under --output-dir): the packed genome blob,
the header-offset map, and the postings/offsets blobs for O(1) bucket lookups."
)]
struct Args {
    /// Reference FASTA file to index.
    #[arg(required = true)]
    reference: PathBuf,

    /// Directory to write the four output files into. Defaults to the
    /// reference file's own directory.
    #[arg(long = "output-dir", value_parser)]
    output_dir: Option<PathBuf>,

    /// The number of worker threads to use. Must be at least 1.
    #[arg(
        short = 'p',
        long = "num-threads",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = num_cpus::get() as u64
    )]
    num_threads: u64,

    /// Reload the postings/offsets blobs after writing them and check
    /// they describe the same bucket contents the in-memory index did.
    #[arg(long = "verify", action, default_value_t = true)]
    verify: bool,
}

fn run(args: Args) -> kindex::error::Result<()> {
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| args.reference.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    let start = Instant::now();
    kindex::pipeline::run(&args.reference, &output_dir, args.num_threads as usize, args.verify)?;
    println!("total time: {:?}", start.elapsed());
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
