use std::time::{Duration, Instant, SystemTime};

use reqwest::Client;

use crate::plan::RequestSpec;
use crate::prelude::*;

/// Outcome of one executed request spec.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestResult {
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    pub duration: Duration,
    pub endpoint_url: String,
    pub page_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub status: u16,
}

/// One client per worker: a single idle slot and no cross-worker pooling, so
/// every worker drives its own connection to the service.
pub fn build_client() -> Result<Client> {
    Ok(Client::builder()
        .pool_max_idle_per_host(1)
        .tcp_nodelay(true)
        .no_proxy()
        .build()?)
}

/// Issues one GET against the spec's endpoint and measures wall time around
/// it. A non-2xx status is recorded in the result, not treated as a failure;
/// transport faults propagate so the dispatcher sees them. No retries: a
/// silently dropped sample would bias the benchmark.
pub async fn invoke(client: &Client, spec: &RequestSpec) -> Result<RequestResult> {
    info!(
        "Initiating request {}/{}: {}",
        spec.seq, spec.total, spec.endpoint_url
    );

    let started_at = SystemTime::now();
    let stopwatch = Instant::now();
    let response = client
        .get(&spec.endpoint_url)
        .query(&spec.params)
        .send()
        .await?;
    let status = response.status();
    let body = response.bytes().await?;
    let duration = stopwatch.elapsed();
    let finished_at = SystemTime::now();

    if !status.is_success() {
        error!(
            "Non-OK response for request {}/{}:\n{}",
            spec.seq,
            spec.total,
            String::from_utf8_lossy(&body)
        );
    }

    Ok(RequestResult {
        started_at,
        finished_at,
        duration,
        endpoint_url: spec.endpoint_url.clone(),
        page_url: spec.page_url.clone(),
        width: spec.width,
        height: spec.height,
        status: status.as_u16(),
    })
}
