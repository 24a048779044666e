use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use reqwest::Client;
use tokio::process::{Child, Command};

use crate::prelude::*;

/// How the service-under-test process is launched.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Binary to launch.
    pub command: PathBuf,
    /// Port the service API listens on.
    pub port: u16,
    /// Log file the service writes to.
    pub logfile: PathBuf,
    /// Arguments appended after port and log file. The defaults disable the
    /// script sandbox, force headless rendering and raise the per-request
    /// timeout ceiling so slow renders are measured rather than killed.
    pub extra_args: Vec<String>,
    /// How long to wait for the HTTP surface to come up.
    pub startup_timeout: Duration,
}

impl ServiceConfig {
    pub fn new(command: PathBuf, port: u16, logfile: PathBuf) -> Self {
        ServiceConfig {
            command,
            port,
            logfile,
            extra_args: vec![
                "--disable-sandbox".to_string(),
                "--headless".to_string(),
                "--max-timeout=600".to_string(),
            ],
            startup_timeout: Duration::from_secs(60),
        }
    }
}

/// Running service-under-test process. `stop` kills and reaps the child;
/// `kill_on_drop` covers paths that never reach it.
#[derive(Debug)]
pub struct ServiceUnderTest {
    child: Child,
    command: String,
    base_url: String,
}

impl ServiceUnderTest {
    pub async fn start(config: &ServiceConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.arg("--port")
            .arg(config.port.to_string())
            .arg("--logfile")
            .arg(&config.logfile)
            .args(&config.extra_args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        debug!("Starting service: {:?}", cmd);

        let child = cmd.spawn()?;
        let mut service = ServiceUnderTest {
            child,
            command: config.command.display().to_string(),
            base_url: format!("http://localhost:{}", config.port),
        };

        if let Err(err) = service.wait_ready(config.startup_timeout).await {
            service.stop().await;
            return Err(err);
        }
        info!("Service ready at {}", service.base_url);
        Ok(service)
    }

    /// Polls the HTTP surface until the service answers at all, the child
    /// exits, or the startup timeout passes.
    async fn wait_ready(&mut self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let start = tokio::time::Instant::now();
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Err(Error::ServiceExitedError {
                    cmd: self.command.clone(),
                    status,
                });
            }
            if client.get(&self.base_url).send().await.is_ok() {
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(Error::ServiceStartTimeoutError);
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of one of the service endpoints, e.g. `render.png`.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    pub async fn stop(mut self) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}
