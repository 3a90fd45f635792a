// ─── Rewrite Engine ───
// Scan → resolve the cache → fetch what is missing → rewrite tokens.
// Output is produced only after every required file is on disk.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::cache::{self, CacheDirectory};
use crate::core::downloader::{DownloadTask, Downloader};
use crate::core::error::{FixerError, FixerResult};
use crate::core::lwjgl::listing::{parse_listing, url_path};
use crate::core::lwjgl::{lookup, modules_for, LibraryGeneration, ManifestEntry, LWJGL3_RELEASE};
use crate::core::platform::Platform;
use crate::core::state::FixerConfig;

use super::scanner::{
    get_classpath_separator, scan, ScanAnomaly, ScanResult, LWJGL_LIBRARY_PATH_FLAG,
};

/// Inputs that stay fixed for one invocation.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub base_path: PathBuf,
    pub can_download: bool,
    pub verify_checksums: bool,
    pub lwjgl3_repository: String,
    pub lwjgl2_repository: String,
}

impl From<&FixerConfig> for RewriteOptions {
    fn from(config: &FixerConfig) -> Self {
        Self {
            base_path: config.lwjgl_base_path.clone(),
            can_download: config.can_download,
            verify_checksums: config.verify_checksums,
            lwjgl3_repository: config.lwjgl3_repository.clone(),
            lwjgl2_repository: config.lwjgl2_repository.clone(),
        }
    }
}

pub struct RewriteEngine {
    options: RewriteOptions,
    platform: Platform,
    downloader: Downloader,
}

impl RewriteEngine {
    pub fn new(options: RewriteOptions, platform: Platform, downloader: Downloader) -> Self {
        Self {
            options,
            platform,
            downloader,
        }
    }

    pub fn from_config(config: &FixerConfig, platform: Platform) -> FixerResult<Self> {
        let downloader = Downloader::new(config.download_timeout())?
            .with_concurrency(config.max_concurrent_downloads)
            .with_retries(config.download_retries);
        Ok(Self::new(RewriteOptions::from(config), platform, downloader))
    }

    /// Rewrite a launch command so LWJGL resolves to files built for this
    /// platform. Commands without LWJGL references come back unchanged.
    pub async fn rewrite(&self, tokens: Vec<String>) -> FixerResult<Vec<String>> {
        // ── SCANNED ──
        let scanned = scan(&tokens);
        let Some(generation) = scanned.generation else {
            info!("No LWJGL references found, launching unchanged");
            return Ok(tokens);
        };
        for anomaly in &scanned.anomalies {
            if let ScanAnomaly::UnknownModule(module) = anomaly {
                warn!("Unknown LWJGL module {} stays on the classpath as is", module);
            }
        }

        // ── RESOLVING ──
        let cache = cache::resolve(&self.options.base_path, generation, self.platform.arch)?;
        let required = required_entries(&scanned, generation);
        let missing = cache::missing_files(&self.platform, &cache, &required);

        // ── FETCHING ──
        if !missing.is_empty() {
            let files = cache::describe_missing(&self.platform, &cache, &missing);
            info!(
                "{} LWJGL files not found in {:?}: {}",
                files.len(),
                cache.path(),
                files.join(", ")
            );
            if !self.options.can_download {
                return Err(FixerError::DownloadDisabled {
                    directory: cache.path().to_path_buf(),
                    files,
                });
            }
            match generation {
                LibraryGeneration::V3 => self.fetch_modules(&cache, &missing).await?,
                LibraryGeneration::V2 => {
                    for entry in &missing {
                        self.fetch_bundle(&cache, entry).await?;
                    }
                }
            }
        }

        // ── REWRITING ──
        let rewritten = match generation {
            LibraryGeneration::V3 => self.rewrite_v3(tokens, &scanned, &cache),
            LibraryGeneration::V2 => rewrite_v2(tokens, &scanned, &cache),
        };

        info!(
            "Rewrote LWJGL paths for {} ({})",
            scanned.game_version.as_deref().unwrap_or("Legacy Minecraft"),
            generation
        );
        Ok(rewritten)
    }

    async fn fetch_modules(
        &self,
        cache: &CacheDirectory,
        missing: &[&'static ManifestEntry],
    ) -> FixerResult<()> {
        let tasks: Vec<DownloadTask> = missing
            .iter()
            .flat_map(|entry| {
                entry
                    .file_names(&self.platform)
                    .into_iter()
                    .filter(|name| !cache.file(name).is_file())
                    .map(|name| {
                        let url = entry.module_file_url(&self.options.lwjgl3_repository, &name);
                        DownloadTask {
                            module: entry.module.to_string(),
                            sha1_url: self
                                .options
                                .verify_checksums
                                .then(|| format!("{url}.sha1")),
                            url,
                            dest: cache.file(&name),
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        self.downloader.fetch_all(tasks).await?;
        Ok(())
    }

    /// Fetch the LWJGL 2 bundle into a staging directory, then move it into
    /// the cache once every file arrived.
    async fn fetch_bundle(&self, cache: &CacheDirectory, entry: &ManifestEntry) -> FixerResult<()> {
        let arch = cache.architecture();
        let Some(listing_url) = entry
            .bundle_listing_url(&self.options.lwjgl2_repository, arch)
            .filter(|_| entry.supports(arch))
        else {
            return Err(FixerError::BundleUnavailable {
                generation: cache.generation().number(),
                architecture: arch.to_string(),
                directory: cache.path().to_path_buf(),
            });
        };

        info!("Downloading LWJGL 2 bundle listing from {}", listing_url);
        let listing = self.downloader.fetch_bytes(entry.module, &listing_url).await?;
        let paths = parse_listing(&listing_url, &listing)?;

        let staging = staging_dir(cache.path());
        let base_url = entry.bundle_base_url(&self.options.lwjgl2_repository, arch);
        let tasks: Vec<DownloadTask> = paths
            .iter()
            .map(|path| DownloadTask {
                module: entry.module.to_string(),
                url: format!("{}/{}", base_url, url_path(path)),
                dest: staging.join(path),
                sha1_url: None,
            })
            .collect();

        let result = match self.downloader.fetch_all(tasks).await {
            Ok(_) => promote_staging(&staging, cache.path()),
            Err(err) => Err(err),
        };
        let _ = std::fs::remove_dir_all(&staging);
        result
    }

    fn rewrite_v3(
        &self,
        mut tokens: Vec<String>,
        scanned: &ScanResult,
        cache: &CacheDirectory,
    ) -> Vec<String> {
        if let Some(index) = scanned.classpath_index {
            let mut handled = HashSet::new();
            let mut other_releases = BTreeSet::new();
            let mut entries: Vec<String> = Vec::with_capacity(scanned.entries.len());

            for entry in &scanned.entries {
                if !entry.is_lwjgl() {
                    entries.push(entry.raw.clone());
                    continue;
                }
                let known = if entry.generation == Some(LibraryGeneration::V2) {
                    warn!("Leaving LWJGL 2 entry {} in place", entry.raw);
                    None
                } else {
                    entry
                        .module
                        .as_deref()
                        .and_then(|module| lookup(LibraryGeneration::V3, module))
                };

                let Some(manifest) = known else {
                    entries.push(entry.raw.clone());
                    continue;
                };
                if let Some(version) = entry.version.as_deref().filter(|v| *v != LWJGL3_RELEASE) {
                    other_releases.insert(version.to_string());
                }
                if handled.insert(manifest.module) {
                    for name in manifest.file_names(&self.platform) {
                        entries.push(safe_path_str(&cache.file(&name)));
                    }
                } else {
                    debug!("Dropping {} ({} already substituted)", entry.raw, manifest.module);
                }
            }

            if !other_releases.is_empty() {
                info!(
                    "Classpath references LWJGL {}; substituting {}",
                    other_releases.into_iter().collect::<Vec<_>>().join(", "),
                    LWJGL3_RELEASE
                );
            }

            dedup_preserving_order(&mut entries);
            tokens[index] = entries.join(get_classpath_separator());
        }

        if let Some(index) = scanned.native_path_index {
            tokens[index] = format!("{}{}", LWJGL_LIBRARY_PATH_FLAG, safe_path_str(cache.path()));
        }

        tokens
    }
}

fn rewrite_v2(mut tokens: Vec<String>, scanned: &ScanResult, cache: &CacheDirectory) -> Vec<String> {
    let library_dir = safe_path_str(cache.path());

    match scanned.native_path_index {
        Some(index) => {
            tokens[index] = format!("{}{}", LWJGL_LIBRARY_PATH_FLAG, library_dir);
        }
        None => {
            info!("LWJGL library path is not supplied, setting it to {:?}", library_dir);
            let at = scanned
                .classpath_flag_index
                .or(scanned.classpath_index)
                .unwrap_or_else(|| tokens.len().min(1));
            tokens.insert(at, format!("{}{}", LWJGL_LIBRARY_PATH_FLAG, library_dir));
        }
    }

    tokens
}

/// Manifest rows the scanned command needs, in first-occurrence order.
fn required_entries(scanned: &ScanResult, generation: LibraryGeneration) -> Vec<&'static ManifestEntry> {
    match generation {
        LibraryGeneration::V2 => modules_for(LibraryGeneration::V2).iter().collect(),
        LibraryGeneration::V3 => {
            let mut seen = HashSet::new();
            scanned
                .entries
                .iter()
                .filter(|entry| entry.generation == Some(LibraryGeneration::V3))
                .filter_map(|entry| entry.module.as_deref())
                .filter_map(|module| lookup(LibraryGeneration::V3, module))
                .filter(|entry| seen.insert(entry.module))
                .collect()
        }
    }
}

fn staging_dir(cache_path: &Path) -> PathBuf {
    let name = cache_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    cache_path.with_file_name(format!(".{}.staging-{}", name, Uuid::new_v4().simple()))
}

fn promote_staging(staging: &Path, target: &Path) -> FixerResult<()> {
    let io_error = |path: &Path, source| FixerError::Io {
        path: path.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(staging).map_err(|e| io_error(staging, e))? {
        let entry = entry.map_err(|e| io_error(staging, e))?;
        let destination = target.join(entry.file_name());
        std::fs::rename(entry.path(), &destination).map_err(|e| io_error(&destination, e))?;
    }
    debug!("Moved LWJGL 2 bundle into {:?}", target);
    Ok(())
}

fn dedup_preserving_order(entries: &mut Vec<String>) {
    let mut seen = HashSet::new();
    entries.retain(|entry| {
        let key = if cfg!(target_os = "windows") {
            entry.to_lowercase()
        } else {
            entry.clone()
        };
        seen.insert(key)
    });
}

/// Render a path for the Java command line.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // Java rejects extended-length paths on the classpath.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
