use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

use crate::prelude::*;

/// Serves the mirrored page corpus over plain HTTP for the lifetime of one
/// run. The harness never inspects what it serves; it only hands out URLs.
#[derive(Debug)]
pub struct FileServer {
    addr: SocketAddr,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl FileServer {
    pub async fn start(port: u16, root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::ConfigError(format!(
                "pages directory {} does not exist",
                root.display()
            )));
        }

        let app = Router::new().fallback_service(ServeDir::new(root));
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let addr = listener.local_addr()?;

        let token = CancellationToken::new();
        let token_child = token.clone();
        let handle = tokio::spawn(async move {
            let shutdown = async move { token_child.cancelled().await };
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("File server terminated: {}", err);
            }
        });

        info!("Serving pages on http://{}", addr);
        Ok(FileServer {
            addr,
            token,
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn serves_corpus_pages_and_stops_cleanly() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "<html>alpha</html>").unwrap();

        let server = FileServer::start(0, dir.path()).await.unwrap();
        let url = format!("{}/a.html", server.base_url());

        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert_eq!(body, "<html>alpha</html>");

        server.stop().await;
        assert!(reqwest::get(&url).await.is_err());
    }

    #[tokio::test]
    async fn missing_root_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nope");
        let outcome = FileServer::start(0, &gone).await;
        assert!(matches!(outcome, Err(Error::ConfigError(_))));
    }
}
