use std::collections::HashSet;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::cache::PARTIAL_SUFFIX;
use crate::core::error::{FixerError, FixerResult};
use crate::core::http::build_http_client;

/// A single file to fetch into the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Module the file belongs to, for error reports.
    pub module: String,
    pub url: String,
    pub dest: PathBuf,
    /// Published `.sha1` of the file, when the source offers one.
    pub sha1_url: Option<String>,
}

/// Concurrent downloader with per-task deadlines and atomic placement.
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads.
    concurrency: usize,
    /// Deadline for each task, retries included.
    timeout: Duration,
    /// Extra attempts after a transport-level failure.
    retries: u32,
}

impl Downloader {
    pub fn new(timeout: Duration) -> FixerResult<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            concurrency: 8,
            timeout,
            retries: 2,
        })
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_retries(mut self, n: u32) -> Self {
        self.retries = n;
        self
    }

    // ── Single file download ────────────────────────────

    /// Download one task to its destination.
    ///
    /// Bytes are streamed to a hidden `.part` file next to the destination
    /// and renamed into place only once the transfer is complete and
    /// verified, so the final name never refers to a partial file.
    pub async fn fetch(&self, task: &DownloadTask) -> FixerResult<PathBuf> {
        let temp = partial_path(&task.dest);

        let result = match tokio::time::timeout(self.timeout, self.fetch_to(task, &temp)).await {
            Ok(result) => result,
            Err(_) => Err(failed(
                task,
                format!("timed out after {}s", self.timeout.as_secs_f32()),
            )),
        };

        if result.is_err() && temp.exists() {
            let _ = tokio::fs::remove_file(&temp).await;
        }
        result.map(|()| task.dest.clone())
    }

    async fn fetch_to(&self, task: &DownloadTask, temp: &Path) -> FixerResult<()> {
        if let Some(parent) = task.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FixerError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let expected_sha1 = match &task.sha1_url {
            Some(url) => self.published_sha1(task, url).await?,
            None => None,
        };

        let response = self.get_with_retry(task, &task.url).await?;
        let declared_len = response.content_length();

        let mut hasher = Sha1::new();
        let mut written = 0_u64;
        {
            let mut file = tokio::fs::File::create(temp)
                .await
                .map_err(|source| FixerError::Io {
                    path: temp.to_path_buf(),
                    source,
                })?;

            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|e| failed(task, e))?;
                hasher.update(&chunk);
                file.write_all(&chunk)
                    .await
                    .map_err(|source| FixerError::Io {
                        path: temp.to_path_buf(),
                        source,
                    })?;
                written = written.saturating_add(chunk.len() as u64);
            }

            file.flush().await.map_err(|source| FixerError::Io {
                path: temp.to_path_buf(),
                source,
            })?;
            file.sync_all().await.map_err(|source| FixerError::Io {
                path: temp.to_path_buf(),
                source,
            })?;
            // file is dropped here, before the rename
        }

        if let Some(expected) = declared_len {
            if expected != written {
                return Err(failed(
                    task,
                    format!("incomplete transfer: {written} of {expected} bytes"),
                ));
            }
        }

        if let Some(expected) = expected_sha1 {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(&expected) {
                return Err(FixerError::ChecksumMismatch {
                    module: task.module.clone(),
                    url: task.url.clone(),
                    path: task.dest.clone(),
                    expected,
                    actual,
                });
            }
        }

        make_executable(temp).await?;

        tokio::fs::rename(temp, &task.dest)
            .await
            .map_err(|source| FixerError::Io {
                path: task.dest.clone(),
                source,
            })?;

        debug!("Downloaded: {} -> {:?} ({} bytes)", task.url, task.dest, written);
        Ok(())
    }

    /// Fetch a small document (such as a bundle listing) into memory.
    pub async fn fetch_bytes(&self, module: &str, url: &str) -> FixerResult<Vec<u8>> {
        let task = DownloadTask {
            module: module.to_string(),
            url: url.to_string(),
            dest: PathBuf::new(),
            sha1_url: None,
        };

        let request = async {
            let response = self.get_with_retry(&task, url).await?;
            let bytes = response.bytes().await.map_err(|e| failed(&task, e))?;
            Ok::<_, FixerError>(bytes.to_vec())
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(failed(
                &task,
                format!("timed out after {}s", self.timeout.as_secs_f32()),
            )),
        }
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download many tasks concurrently using `buffer_unordered`.
    ///
    /// Tasks sharing a destination are fetched once. Every task runs to
    /// completion or its own timeout; if any failed, the first failure is
    /// returned after all of them have settled.
    pub async fn fetch_all(&self, tasks: Vec<DownloadTask>) -> FixerResult<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let unique: Vec<DownloadTask> = tasks
            .into_iter()
            .filter(|task| seen.insert(task.dest.clone()))
            .collect();

        info!(
            "Starting batch download: {} files, concurrency={}",
            unique.len(),
            self.concurrency
        );

        let results: Vec<FixerResult<PathBuf>> = stream::iter(unique.iter())
            .map(|task| self.fetch(task))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut fetched = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(path) => fetched.push(path),
                Err(err) => {
                    warn!("{}", err);
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("{} files downloaded.", fetched.len());
                Ok(fetched)
            }
        }
    }

    // ── Helpers ─────────────────────────────────────────

    async fn published_sha1(&self, task: &DownloadTask, url: &str) -> FixerResult<Option<String>> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Checksum for {} unavailable ({}); skipping verification", task.url, e);
                return Ok(None);
            }
        };
        if !response.status().is_success() {
            warn!(
                "Checksum for {} unavailable (HTTP {}); skipping verification",
                task.url,
                response.status().as_u16()
            );
            return Ok(None);
        }
        let text = response.text().await.map_err(|e| failed(task, e))?;
        Ok(text
            .split_whitespace()
            .next()
            .map(|hash| hash.to_ascii_lowercase()))
    }

    async fn get_with_retry(
        &self,
        task: &DownloadTask,
        url: &str,
    ) -> FixerResult<reqwest::Response> {
        let mut last_error: Option<FixerError> = None;
        for attempt in 0..=self.retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let error = failed(task, format!("HTTP {}", status.as_u16()));
                    if !is_retryable(status) {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(err) => last_error = Some(failed(task, err)),
            }
            if attempt < self.retries {
                let backoff_ms = 2_u64.pow(attempt + 1) * 250;
                debug!("Retrying {} in {}ms", url, backoff_ms);
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
        Err(last_error.unwrap_or_else(|| failed(task, "no attempt was made")))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn failed(task: &DownloadTask, cause: impl Display) -> FixerError {
    FixerError::DownloadFailed {
        module: task.module.clone(),
        url: task.url.clone(),
        cause: cause.to_string(),
    }
}

/// Hidden sibling used while a download is in flight.
fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}{}", name, Uuid::new_v4().simple(), PARTIAL_SUFFIX))
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> FixerResult<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|source| FixerError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> FixerResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{FileServer, Route};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("downloader-test-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn task(server: &FileServer, route: &str, dest: PathBuf) -> DownloadTask {
        DownloadTask {
            module: "lwjgl-glfw".into(),
            url: server.url_for(route),
            dest,
            sha1_url: None,
        }
    }

    fn leftover_partials(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(PARTIAL_SUFFIX))
            .count()
    }

    #[tokio::test]
    async fn fetch_places_complete_file_under_final_name() {
        let dir = temp_dir("complete");
        let server = FileServer::start(vec![("/a.jar", Route::bytes(b"jar-bytes"))]);
        let downloader = Downloader::new(Duration::from_secs(5)).unwrap();

        let dest = dir.join("a.jar");
        let path = downloader.fetch(&task(&server, "/a.jar", dest.clone())).await.unwrap();

        assert_eq!(path, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jar-bytes");
        assert_eq!(leftover_partials(&dir), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn http_errors_name_module_and_source() {
        let dir = temp_dir("not-found");
        let server = FileServer::start(vec![]);
        let downloader = Downloader::new(Duration::from_secs(5)).unwrap();

        let dest = dir.join("missing.jar");
        let err = downloader
            .fetch(&task(&server, "/missing.jar", dest.clone()))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("lwjgl-glfw"));
        assert!(message.contains("/missing.jar"));
        assert!(message.contains("HTTP 404"));
        assert!(!dest.exists());
        assert_eq!(leftover_partials(&dir), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn timeout_discards_the_partial_file() {
        let dir = temp_dir("timeout");
        let server = FileServer::start(vec![(
            "/slow.jar",
            Route::delayed(Duration::from_secs(3), b"late"),
        )]);
        let downloader = Downloader::new(Duration::from_millis(500)).unwrap();

        let dest = dir.join("slow.jar");
        let err = downloader
            .fetch(&task(&server, "/slow.jar", dest.clone()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("timed out"));
        assert!(!dest.exists());
        assert_eq!(leftover_partials(&dir), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn published_checksum_is_enforced() {
        let dir = temp_dir("checksum");
        let server = FileServer::start(vec![
            ("/good.jar", Route::bytes(b"good")),
            ("/good.jar.sha1", Route::bytes(sha1_hex(b"good").as_bytes())),
            ("/bad.jar", Route::bytes(b"tampered")),
            ("/bad.jar.sha1", Route::bytes(sha1_hex(b"original").as_bytes())),
        ]);
        let downloader = Downloader::new(Duration::from_secs(5)).unwrap();

        let mut good = task(&server, "/good.jar", dir.join("good.jar"));
        good.sha1_url = Some(server.url_for("/good.jar.sha1"));
        downloader.fetch(&good).await.unwrap();

        let mut bad = task(&server, "/bad.jar", dir.join("bad.jar"));
        bad.sha1_url = Some(server.url_for("/bad.jar.sha1"));
        let err = downloader.fetch(&bad).await.unwrap_err();

        assert!(matches!(err, FixerError::ChecksumMismatch { .. }));
        assert!(err.to_string().contains("lwjgl-glfw from "));
        assert!(err.to_string().contains("/bad.jar"));
        assert!(dir.join("good.jar").exists());
        assert!(!dir.join("bad.jar").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn fetch_all_deduplicates_by_destination() {
        let dir = temp_dir("dedup");
        let server = FileServer::start(vec![
            ("/a.jar", Route::bytes(b"a")),
            ("/b.jar", Route::bytes(b"b")),
        ]);
        let downloader = Downloader::new(Duration::from_secs(5))
            .unwrap()
            .with_concurrency(2);

        let tasks = vec![
            task(&server, "/a.jar", dir.join("a.jar")),
            task(&server, "/a.jar", dir.join("a.jar")),
            task(&server, "/b.jar", dir.join("b.jar")),
        ];
        let fetched = downloader.fetch_all(tasks).await.unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(server.hits("/a.jar"), 1);
        assert_eq!(server.hits("/b.jar"), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn fetch_all_fails_when_any_task_fails() {
        let dir = temp_dir("batch-failure");
        let server = FileServer::start(vec![("/a.jar", Route::bytes(b"a"))]);
        let downloader = Downloader::new(Duration::from_secs(5))
            .unwrap()
            .with_retries(0);

        let tasks = vec![
            task(&server, "/a.jar", dir.join("a.jar")),
            task(&server, "/gone.jar", dir.join("gone.jar")),
        ];
        let err = downloader.fetch_all(tasks).await.unwrap_err();

        assert!(err.to_string().contains("/gone.jar"));
        assert_eq!(server.hits("/a.jar"), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let dir = temp_dir("retry");
        let server = FileServer::start(vec![("/flaky.jar", Route::status(503))]);
        let downloader = Downloader::new(Duration::from_secs(10))
            .unwrap()
            .with_retries(1);

        let err = downloader
            .fetch(&task(&server, "/flaky.jar", dir.join("flaky.jar")))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("HTTP 503"));
        assert_eq!(server.hits("/flaky.jar"), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn sha1_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }
}
