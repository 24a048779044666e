use std::sync::{Arc, Mutex};

use crate::executor::RequestResult;
use crate::prelude::*;

/// Thread-safe sink for request results. Clones share the underlying buffer;
/// appends are serialized by the lock, which is held only for the push.
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    results: Arc<Mutex<Vec<RequestResult>>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: RequestResult) -> Result<()> {
        let mut results = self.results.lock().map_err(|_| Error::PoisonError)?;
        results.push(result);
        Ok(())
    }

    /// Yields the collected results as an immutable snapshot. Fails unless
    /// exactly `dispatched` results were collected: a lost or duplicated
    /// sample invalidates the run.
    pub fn finalize(self, dispatched: usize) -> Result<Vec<RequestResult>> {
        let mut results = self.results.lock().map_err(|_| Error::PoisonError)?;
        let results = std::mem::take(&mut *results);
        if results.len() != dispatched {
            return Err(Error::ResultCountMismatch {
                dispatched,
                collected: results.len(),
            });
        }
        Ok(results)
    }
}
