//! Metric sources — where utilization samples come from.

use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;

use anyhow::{Context, anyhow};
use tracing::debug;

use tierscale_core::UtilizationSample;

use crate::window::{ResourceStatRow, summarize};

/// Boxed future alias for collaborator calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Supplies the latest utilization sample.
///
/// `Ok(None)` means the source had nothing to report this tick (for example
/// while a tier change is in progress); it is not an error. Sources are
/// expected to average over exactly `required_data_points` rows.
pub trait MetricSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Option<UtilizationSample>>;
}

/// Reads resource-stat rows from a JSON-lines file and summarizes the newest
/// `window` of them.
///
/// Each line is one [`ResourceStatRow`]. A missing or empty file is "no
/// data"; a malformed line fails the fetch.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
    window: u32,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>, window: u32) -> Self {
        Self {
            path: path.into(),
            window,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rows(&self) -> anyhow::Result<Vec<ResourceStatRow>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        let mut rows = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row: ResourceStatRow = serde_json::from_str(line)
                .with_context(|| format!("{}:{}: malformed row", self.path.display(), i + 1))?;
            rows.push(row);
        }
        Ok(rows)
    }
}

impl MetricSource for JsonLinesSource {
    fn fetch(&self) -> BoxFuture<'_, Option<UtilizationSample>> {
        Box::pin(async move {
            let rows = self.read_rows().await?;
            let sample = summarize(&rows, self.window);
            debug!(
                path = %self.path.display(),
                rows = rows.len(),
                found = sample.is_some(),
                "resource stats read"
            );
            Ok(sample)
        })
    }
}

/// Replays queued samples in order, then reports no data.
#[derive(Debug, Default)]
pub struct StaticSource {
    queue: Mutex<VecDeque<Option<UtilizationSample>>>,
}

impl StaticSource {
    pub fn new(samples: impl IntoIterator<Item = Option<UtilizationSample>>) -> Self {
        Self {
            queue: Mutex::new(samples.into_iter().collect()),
        }
    }

    pub fn push(&self, sample: Option<UtilizationSample>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(sample);
        }
    }
}

impl MetricSource for StaticSource {
    fn fetch(&self) -> BoxFuture<'_, Option<UtilizationSample>> {
        let next = self
            .queue
            .lock()
            .map_err(|_| anyhow!("sample queue poisoned"))
            .map(|mut q| q.pop_front().flatten());
        Box::pin(async move { next })
    }
}
