use reqwest::Client;
use serde::Deserialize;

use crate::prelude::*;

/// Script payload asking the service for its own performance counters.
const PERF_STATS_SCRIPT: &str = r#"
function main(page)
  return page:get_perf_stats()
end
"#;

/// Resource counters the service reports about itself. Field names are the
/// service's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ResourceUsageReport {
    /// Peak resident set size, in bytes.
    pub maxrss: u64,
    /// CPU time consumed, in seconds.
    pub cputime: f64,
}

/// Queries the script-execution endpoint once, after all request results are
/// in, for the service's peak memory and CPU time.
pub async fn fetch_resource_usage(
    client: &Client,
    execute_url: &str,
) -> Result<ResourceUsageReport> {
    let response = client
        .get(execute_url)
        .query(&[("lua_source", PERF_STATS_SCRIPT)])
        .send()
        .await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(Error::ProbeError(format!(
            "stats endpoint returned {}: {}",
            status,
            String::from_utf8_lossy(&body)
        )));
    }
    serde_json::from_slice(&body)
        .map_err(|err| Error::ProbeError(format!("malformed stats response: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn spawn_stats_server() -> SocketAddr {
        let app = Router::new()
            .route(
                "/execute",
                get(|| async {
                    Json(serde_json::json!({"maxrss": 1_048_576u64, "cputime": 12.5}))
                }),
            )
            .route("/garbled", get(|| async { "not json at all" }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn parses_counters_from_the_service() {
        let addr = spawn_stats_server().await;
        let client = Client::new();

        let usage = fetch_resource_usage(&client, &format!("http://{}/execute", addr))
            .await
            .unwrap();
        assert_eq!(usage.maxrss, 1_048_576);
        assert_eq!(usage.cputime, 12.5);
    }

    #[tokio::test]
    async fn malformed_body_is_a_probe_error() {
        let addr = spawn_stats_server().await;
        let client = Client::new();

        let outcome = fetch_resource_usage(&client, &format!("http://{}/garbled", addr)).await;
        assert!(matches!(outcome, Err(Error::ProbeError(_))));
    }

    #[tokio::test]
    async fn non_2xx_status_is_a_probe_error() {
        let addr = spawn_stats_server().await;
        let client = Client::new();

        let outcome = fetch_resource_usage(&client, &format!("http://{}/missing", addr)).await;
        assert!(matches!(outcome, Err(Error::ProbeError(_))));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let outcome: std::result::Result<ResourceUsageReport, _> =
            serde_json::from_str(r#"{"maxrss": 42}"#);
        assert!(outcome.is_err());
    }
}
