//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Replay a four-processor trace through a snooping cache-coherence bus
/// and report per-core and bus-wide cycle/traffic counters.
#[derive(Debug, Parser)]
#[command(name = "coherence-cli", version, about)]
pub struct Cli {
    /// Coherence protocol to simulate: MESI or DRAGON. Anything else
    /// selects `Protocol::None`, in which case the run reports zeroed
    /// counters rather than failing.
    pub protocol: String,

    /// Trace family name; cores read `traces/{trace}_0.data` .. `_3.data`.
    pub trace: String,

    /// Total cache size in bytes. Must be a power of two.
    pub cache_size: usize,

    /// Set associativity (1 = direct-mapped).
    pub associativity: usize,

    /// Block size in bytes. Must be a power of two.
    pub block_size: usize,

    /// Directory containing the per-core trace files.
    #[arg(long, default_value = "traces")]
    pub trace_dir: PathBuf,

    /// File the final statistics report is written to.
    #[arg(short, long, default_value = "results.txt")]
    pub output: PathBuf,
}
