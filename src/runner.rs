use std::time::{Instant, SystemTime};

use crate::config::BenchConfig;
use crate::dispatch;
use crate::executor;
use crate::file_server::FileServer;
use crate::plan::RequestPlan;
use crate::prelude::*;
use crate::probe;
use crate::report::BenchmarkReport;
use crate::service::ServiceUnderTest;

/// Runs one full benchmark: collaborators up, plan, dispatch, probe,
/// collaborators down on every exit path.
pub async fn run(config: BenchConfig) -> Result<BenchmarkReport> {
    let file_server = FileServer::start(config.pages_port, &config.pages_dir).await?;

    let service = match ServiceUnderTest::start(&config.service).await {
        Ok(service) => service,
        Err(err) => {
            file_server.stop().await;
            return Err(err);
        }
    };

    let outcome = execute(&config, &file_server, &service).await;

    service.stop().await;
    file_server.stop().await;

    outcome
}

async fn execute(
    config: &BenchConfig,
    file_server: &FileServer,
    service: &ServiceUnderTest,
) -> Result<BenchmarkReport> {
    let plan = RequestPlan::new(
        config.seed,
        config.request_count,
        config.corpus.clone(),
        config.sizes.clone(),
        file_server.base_url(),
        service.base_url().to_string(),
    )?;

    let started_at = SystemTime::now();
    let stopwatch = Instant::now();
    let results = dispatch::dispatch(plan, config.thread_count).await?;
    let wall_time = stopwatch.elapsed();
    let finished_at = SystemTime::now();

    // The samples are already safely collected; a failed probe only costs
    // the counters, never the run.
    let client = executor::build_client()?;
    let resources = match probe::fetch_resource_usage(&client, &service.url_for("execute")).await {
        Ok(resources) => Some(resources),
        Err(err) => {
            warn!("Resource stats probe failed: {}", err);
            None
        }
    };

    Ok(BenchmarkReport {
        results,
        started_at,
        finished_at,
        wall_time,
        resources,
    })
}
