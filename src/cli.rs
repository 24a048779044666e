use std::path::PathBuf;

use clap::Parser;

/// Deterministic load benchmark for an HTML rendering service.
///
/// Serves a previously mirrored page corpus from a local static file server
/// and fires a seed-derived sequence of render requests at the service under
/// test, then reports per-request latency together with the resource
/// counters the service collected about itself.
#[derive(Debug, Parser)]
#[command(name = "render-bench", version, about)]
pub struct Cli {
    /// PRNG seed number
    #[arg(long, default_value_t = 1234)]
    pub seed: u64,

    /// Request thread count
    #[arg(long, default_value_t = 1)]
    pub thread_count: usize,

    /// Benchmark request count
    #[arg(long, default_value_t = 10)]
    pub request_count: usize,

    /// Directory holding the mirrored page corpus (*.html)
    #[arg(long, default_value = "pages")]
    pub pages_dir: PathBuf,

    /// Port the corpus file server listens on
    #[arg(long, default_value_t = 8806)]
    pub pages_port: u16,

    /// Binary of the rendering service under test
    #[arg(long, default_value = "renderd")]
    pub service_cmd: PathBuf,

    /// Port of the rendering service API
    #[arg(long, default_value_t = 8050)]
    pub service_port: u16,

    /// Log file the rendering service writes to
    #[arg(long, default_value = "service.log")]
    pub service_log: PathBuf,
}
