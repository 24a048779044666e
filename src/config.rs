use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::prelude::*;
use crate::service::ServiceConfig;

/// Viewport candidates drawn for each request. The (None, None) pair renders
/// at the page's natural size and must stay in the set.
pub const SIZE_CANDIDATES: &[(Option<u32>, Option<u32>)] = &[
    (None, None),
    (Some(500), None),
    (None, Some(500)),
    (Some(500), Some(500)),
];

/// Everything one benchmark run needs, resolved up front. The CLI layer
/// supplies the defaults; nothing below reads process-wide state.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub seed: u64,
    pub thread_count: usize,
    pub request_count: usize,
    pub pages_dir: PathBuf,
    pub pages_port: u16,
    pub corpus: Vec<String>,
    pub sizes: Vec<(Option<u32>, Option<u32>)>,
    pub service: ServiceConfig,
}

impl BenchConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.thread_count == 0 {
            return Err(Error::ConfigError(
                "--thread-count must be at least 1".to_string(),
            ));
        }
        if cli.request_count == 0 {
            return Err(Error::ConfigError(
                "--request-count must be at least 1".to_string(),
            ));
        }

        let corpus = discover_corpus(&cli.pages_dir)?;

        Ok(BenchConfig {
            seed: cli.seed,
            thread_count: cli.thread_count,
            request_count: cli.request_count,
            pages_dir: cli.pages_dir,
            pages_port: cli.pages_port,
            corpus,
            sizes: SIZE_CANDIDATES.to_vec(),
            service: ServiceConfig::new(cli.service_cmd, cli.service_port, cli.service_log),
        })
    }
}

/// Lists the corpus page names under `dir`. Sorted so the plan draws from the
/// same ordered corpus on every run regardless of directory iteration order.
pub fn discover_corpus(dir: &Path) -> Result<Vec<String>> {
    let pattern = dir.join("*.html").to_string_lossy().into_owned();
    let entries = glob::glob(&pattern)
        .map_err(|err| Error::ConfigError(format!("bad corpus pattern {}: {}", pattern, err)))?;

    let mut pages = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| Error::ConfigError(err.to_string()))?;
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            pages.push(name.to_string());
        }
    }
    pages.sort();
    Ok(pages)
}
