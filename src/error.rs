use std::io;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Stats probe error: {0}")]
    ProbeError(String),
    #[error("Service start timeout error")]
    ServiceStartTimeoutError,
    #[error("Service '{cmd}' exited during startup with status {status}")]
    ServiceExitedError { cmd: String, status: ExitStatus },
    #[error("Result count mismatch: dispatched {dispatched}, collected {collected}")]
    ResultCountMismatch { dispatched: usize, collected: usize },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    #[error("Lock poisoned")]
    PoisonError,
}
