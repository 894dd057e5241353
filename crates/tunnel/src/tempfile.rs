//! Materializes remote assets on local disk for tools that need random
//! access, and owns their deletion.
//!
//! Not a cache: every `acquire` downloads its own copy. The registry exists
//! only so a background sweep can reclaim files whose owner crashed before
//! calling `release`; the primary cleanup path is the runner's own cleanup
//! routine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use parking_lot::Mutex;
use reqwest::Client;
use rustc_hash::FxHashMap;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use sluice_plan::Container;

use crate::error::StreamError;
use crate::http::header_map;

#[derive(Debug, Clone)]
pub struct TempFileConfig {
    pub dir: PathBuf,
    pub sweep_interval: Duration,
    /// Tracked files older than this are deleted by the sweep.
    pub max_age: Duration,
}

impl Default for TempFileConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
            sweep_interval: Duration::from_secs(60),
            max_age: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug)]
struct TrackedFile {
    path: PathBuf,
    created_at: Instant,
}

#[derive(Debug)]
pub struct TempFileManager {
    config: TempFileConfig,
    client: Client,
    registry: Mutex<FxHashMap<Uuid, TrackedFile>>,
}

impl TempFileManager {
    pub fn new(client: Client, config: TempFileConfig) -> Self {
        Self {
            config,
            client,
            registry: Mutex::new(FxHashMap::default()),
        }
    }

    /// Download `url` fully to local disk and return the path.
    ///
    /// The file is tracked from before the first byte, so a crash mid-way
    /// still leaves something the sweep can find.
    pub async fn acquire(
        &self,
        url: &str,
        headers: &FxHashMap<String, String>,
    ) -> Result<PathBuf, StreamError> {
        tokio::fs::create_dir_all(&self.config.dir).await?;

        let id = Uuid::new_v4();
        let ext = Container::infer_from_url(url)
            .map(|c| c.ext())
            .unwrap_or("bin");
        let path = self.config.dir.join(format!("sluice_{id}.{ext}"));

        self.registry.lock().insert(
            id,
            TrackedFile {
                path: path.clone(),
                created_at: Instant::now(),
            },
        );

        match self.download(url, headers, &path).await {
            Ok(bytes) => {
                debug!(url, path = %path.display(), bytes, "materialized remote asset");
                Ok(path)
            }
            Err(err) => {
                self.registry.lock().remove(&id);
                let _ = tokio::fs::remove_file(&path).await;
                Err(err)
            }
        }
    }

    async fn download(
        &self,
        url: &str,
        headers: &FxHashMap<String, String>,
        path: &Path,
    ) -> Result<u64, StreamError> {
        let response = self
            .client
            .get(url)
            .headers(header_map(headers))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Delete a previously acquired file. Calling it twice (or for a path
    /// that was already swept) is a no-op.
    pub async fn release(&self, path: &Path) {
        self.registry.lock().retain(|_, entry| entry.path != path);
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "released temp file"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "failed to delete temp file"),
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Delete every tracked file older than the configured maximum age.
    pub async fn sweep(&self) {
        let stale: Vec<PathBuf> = {
            let mut registry = self.registry.lock();
            let max_age = self.config.max_age;
            let stale_ids: Vec<Uuid> = registry
                .iter()
                .filter(|(_, entry)| entry.created_at.elapsed() > max_age)
                .map(|(id, _)| *id)
                .collect();
            stale_ids
                .into_iter()
                .filter_map(|id| registry.remove(&id))
                .map(|entry| entry.path)
                .collect()
        };

        for path in stale {
            warn!(path = %path.display(), "sweeping stale temp file");
            let _ = tokio::fs::remove_file(&path).await;
        }
    }

    /// Run the staleness sweep on a fixed interval until `cancel` fires.
    pub fn spawn_sweeper(
        manager: Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(manager.config.sweep_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => manager.sweep().await,
                }
            }
        })
    }
}
