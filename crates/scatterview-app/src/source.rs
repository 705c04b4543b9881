//! Row acquisition capability.

use parking_lot::RwLock;
use scatterview_core::{CancellationToken, Row, SourceError};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

pub type RowsFuture = Pin<Box<dyn Future<Output = Result<Vec<Row>, SourceError>> + Send + 'static>>;

/// Turns a data source identifier into rows.
///
/// Implementations must resolve to `Err(SourceError::Cancelled)` once
/// `cancel` fires, and to some other error for real failures.
pub trait RowSource: Send + Sync {
    fn fetch_rows(&self, url: &str, cancel: CancellationToken) -> RowsFuture;
}

/// Row source backed by datasets registered in memory.
#[derive(Debug, Default)]
pub struct MemoryRowSource {
    datasets: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, rows: Vec<Row>) {
        self.datasets.write().insert(url.into(), rows);
    }
}

impl RowSource for MemoryRowSource {
    fn fetch_rows(&self, url: &str, cancel: CancellationToken) -> RowsFuture {
        let result = self
            .datasets
            .read()
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Other(format!("Unknown source: {url}")));
        Box::pin(async move {
            tokio::task::yield_now().await;
            cancel.check().and(result)
        })
    }
}
