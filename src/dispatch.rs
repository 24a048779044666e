use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;

use crate::collector::ResultCollector;
use crate::executor::{self, RequestResult};
use crate::plan::RequestSpec;
use crate::prelude::*;

/// Fans the request plan out to a bounded pool of `worker_count` workers and
/// fans the results back in. `worker_count == 1` is the same code path, just
/// a degenerate pool: strictly sequential execution in plan order.
///
/// The first transport failure stops spec hand-out; in-flight requests run to
/// completion and the error is surfaced once the pool drains.
pub async fn dispatch<I>(specs: I, worker_count: usize) -> Result<Vec<RequestResult>>
where
    I: Iterator<Item = RequestSpec> + Send + 'static,
{
    if worker_count == 0 {
        return Err(Error::ConfigError(
            "worker count must be at least 1".to_string(),
        ));
    }

    let specs = Arc::new(Mutex::new(specs));
    let collector = ResultCollector::new();
    let dispatched = Arc::new(AtomicUsize::new(0));
    let aborted = Arc::new(AtomicBool::new(false));
    let first_error: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));

    let mut workers = JoinSet::new();
    for _ in 0..worker_count {
        let specs = specs.clone();
        let collector = collector.clone();
        let dispatched = dispatched.clone();
        let aborted = aborted.clone();
        let first_error = first_error.clone();
        let client = executor::build_client()?;

        workers.spawn(async move {
            loop {
                if aborted.load(Ordering::Relaxed) {
                    break;
                }

                // The lock is held only to draw the next spec, never across
                // an await point.
                let spec = match specs.lock() {
                    Ok(mut specs) => specs.next(),
                    Err(_) => {
                        fail(&aborted, &first_error, Error::PoisonError);
                        break;
                    }
                };
                let Some(spec) = spec else {
                    break;
                };
                dispatched.fetch_add(1, Ordering::Relaxed);

                match executor::invoke(&client, &spec).await {
                    Ok(result) => {
                        if let Err(err) = collector.push(result) {
                            fail(&aborted, &first_error, err);
                            break;
                        }
                    }
                    Err(err) => {
                        fail(&aborted, &first_error, err);
                        break;
                    }
                }
            }
        });
    }

    while let Some(joined) = workers.join_next().await {
        joined?;
    }

    if let Some(err) = first_error.lock().map_err(|_| Error::PoisonError)?.take() {
        return Err(err);
    }
    collector.finalize(dispatched.load(Ordering::Relaxed))
}

fn fail(aborted: &AtomicBool, first_error: &Mutex<Option<Error>>, err: Error) {
    aborted.store(true, Ordering::Relaxed);
    if let Ok(mut slot) = first_error.lock() {
        slot.get_or_insert(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn spawn_test_server() -> SocketAddr {
        let app = Router::new()
            .route("/ok", get(|| async { "rendered" }))
            .route(
                "/fail",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn spec(seq: usize, total: usize, endpoint_url: String) -> RequestSpec {
        RequestSpec {
            seq,
            total,
            endpoint_url,
            page_url: format!("http://localhost:8806/{}.html", seq),
            width: None,
            height: None,
            params: Vec::new(),
        }
    }

    #[tokio::test]
    async fn collects_one_result_per_spec() {
        let addr = spawn_test_server().await;
        let specs: Vec<RequestSpec> = (1..=16)
            .map(|i| spec(i, 16, format!("http://{}/ok", addr)))
            .collect();

        let results = dispatch(specs.into_iter(), 4).await.unwrap();
        assert_eq!(results.len(), 16);
        assert!(results.iter().all(|r| r.status == 200));
    }

    #[tokio::test]
    async fn sequential_mode_preserves_plan_order() {
        let addr = spawn_test_server().await;
        let specs: Vec<RequestSpec> = (1..=8)
            .map(|i| spec(i, 8, format!("http://{}/ok", addr)))
            .collect();
        let expected: Vec<String> = specs.iter().map(|s| s.page_url.clone()).collect();

        let results = dispatch(specs.into_iter(), 1).await.unwrap();
        let completed: Vec<String> = results.iter().map(|r| r.page_url.clone()).collect();
        assert_eq!(completed, expected);
    }

    #[tokio::test]
    async fn non_2xx_is_recorded_not_fatal() {
        let addr = spawn_test_server().await;
        let specs = vec![
            spec(1, 3, format!("http://{}/ok", addr)),
            spec(2, 3, format!("http://{}/fail", addr)),
            spec(3, 3, format!("http://{}/ok", addr)),
        ];

        let results = dispatch(specs.into_iter(), 1).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| r.status == 500).count(), 1);
    }

    #[tokio::test]
    async fn transport_failure_aborts_without_hanging() {
        // Reserve a port and release it so connections are refused.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let specs: Vec<RequestSpec> = (1..=4)
            .map(|i| spec(i, 4, format!("http://{}/ok", addr)))
            .collect();

        let outcome = tokio::time::timeout(
            Duration::from_secs(30),
            dispatch(specs.into_iter(), 2),
        )
        .await
        .expect("dispatch hung after transport failure");
        assert!(matches!(outcome, Err(Error::HttpError(_))));
    }

    #[tokio::test]
    async fn abort_stops_issuing_new_work() {
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);
        let live_addr = spawn_test_server().await;

        // Sequential worker: the first spec fails at the transport level, so
        // the remaining specs must never be drawn.
        let drawn = Arc::new(AtomicUsize::new(0));
        let counter = drawn.clone();
        let specs = (1..=5).map(move |i| {
            counter.fetch_add(1, Ordering::Relaxed);
            if i == 1 {
                spec(i, 5, format!("http://{}/ok", dead_addr))
            } else {
                spec(i, 5, format!("http://{}/ok", live_addr))
            }
        });

        let outcome = dispatch(specs, 1).await;
        assert!(outcome.is_err());
        assert_eq!(drawn.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn zero_workers_is_rejected() {
        let outcome = dispatch(Vec::new().into_iter(), 0).await;
        assert!(matches!(outcome, Err(Error::ConfigError(_))));
    }
}
