use std::time::{Duration, SystemTime};

use humanize_bytes::humanize_bytes_binary;

use crate::executor::RequestResult;
use crate::probe::ResourceUsageReport;
use crate::prelude::*;

/// Final aggregate of one harness invocation: every request result in
/// completion order, the run's wall clock, and the service's own resource
/// counters when the probe succeeded. Immutable once assembled; the caller
/// owns logging and export.
#[derive(Debug)]
pub struct BenchmarkReport {
    pub results: Vec<RequestResult>,
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    pub wall_time: Duration,
    pub resources: Option<ResourceUsageReport>,
}

impl BenchmarkReport {
    pub fn emit(&self) {
        info!("Request stats:");
        for (index, result) in self.results.iter().enumerate() {
            info!(
                "  #{:<3} status {} in {:>7.3}s  {}x{}  {} <- {}",
                index,
                result.status,
                result.duration.as_secs_f64(),
                dimension(result.width),
                dimension(result.height),
                result.endpoint_url,
                result.page_url,
            );
        }
        match &self.resources {
            Some(resources) => {
                info!(
                    "Service max RSS: {} B ({})",
                    resources.maxrss,
                    humanize_bytes_binary!(resources.maxrss)
                );
                info!("Service CPU time elapsed: {:.2} sec", resources.cputime);
            }
            None => warn!("Service resource counters unavailable for this run"),
        }
        info!(
            "Wallclock time elapsed: {:.2} sec",
            self.wall_time.as_secs_f64()
        );
    }
}

fn dimension(value: Option<u32>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "auto".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_dimensions_render_as_auto() {
        assert_eq!(dimension(None), "auto");
        assert_eq!(dimension(Some(500)), "500");
    }
}
