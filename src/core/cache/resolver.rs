// ─── Cache Resolver ───
// Locates the per-(generation, architecture) directory holding downloaded
// LWJGL files and reports which required files it still lacks.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{FixerError, FixerResult};
use crate::core::lwjgl::{EntryKind, LibraryGeneration, ManifestEntry};
use crate::core::platform::{Architecture, Platform};

/// Suffix of in-flight downloads. Such files never count as cached.
pub const PARTIAL_SUFFIX: &str = ".part";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirectory {
    path: PathBuf,
    generation: LibraryGeneration,
    architecture: Architecture,
}

impl CacheDirectory {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn generation(&self) -> LibraryGeneration {
        self.generation
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Absolute path of a file inside the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// True when the directory exists and holds at least one finished file.
    pub fn is_populated(&self) -> bool {
        let Ok(entries) = std::fs::read_dir(&self.path) else {
            return false;
        };
        entries.flatten().any(|entry| {
            !entry
                .file_name()
                .to_string_lossy()
                .ends_with(PARTIAL_SUFFIX)
        })
    }
}

/// Directory name for a pair, e.g. `lwjgl_3arm64`.
pub fn cache_dir_name(generation: LibraryGeneration, architecture: Architecture) -> String {
    format!("lwjgl_{}{}", generation.number(), architecture.tag())
}

/// Where the cache directory for a pair lives, without touching the disk.
pub fn cache_dir_path(
    base_path: &Path,
    generation: LibraryGeneration,
    architecture: Architecture,
) -> PathBuf {
    base_path.join(cache_dir_name(generation, architecture))
}

/// Create (idempotently) and return the cache directory for a pair.
pub fn resolve(
    base_path: &Path,
    generation: LibraryGeneration,
    architecture: Architecture,
) -> FixerResult<CacheDirectory> {
    let path = canonical_or_create_dir(&cache_dir_path(base_path, generation, architecture))?;
    debug!("Using LWJGL cache directory {:?}", path);
    Ok(CacheDirectory {
        path,
        generation,
        architecture,
    })
}

/// Entries of `required` whose files are not in `cache`, in input order.
///
/// LWJGL 2 only checks that the directory holds anything at all; LWJGL 3
/// checks every base and natives jar. Reads the disk and nothing else, so
/// repeated calls agree until something is downloaded.
pub fn missing_files(
    platform: &Platform,
    cache: &CacheDirectory,
    required: &[&'static ManifestEntry],
) -> Vec<&'static ManifestEntry> {
    match cache.generation {
        LibraryGeneration::V2 => {
            if cache.is_populated() {
                Vec::new()
            } else {
                required.to_vec()
            }
        }
        LibraryGeneration::V3 => required
            .iter()
            .copied()
            .filter(|entry| {
                entry
                    .file_names(platform)
                    .iter()
                    .any(|name| !cache.file(name).is_file())
            })
            .collect(),
    }
}

/// Human-readable names of what is missing, for error reports.
pub fn describe_missing(
    platform: &Platform,
    cache: &CacheDirectory,
    missing: &[&'static ManifestEntry],
) -> Vec<String> {
    missing
        .iter()
        .flat_map(|entry| match entry.kind {
            EntryKind::Module { .. } => entry
                .file_names(platform)
                .into_iter()
                .filter(|name| !cache.file(name).is_file())
                .collect::<Vec<_>>(),
            EntryKind::Bundle { .. } => vec![format!(
                "{} ({})",
                entry.module,
                cache_dir_name(cache.generation, cache.architecture)
            )],
        })
        .collect()
}

fn canonical_or_create_dir(path: &Path) -> FixerResult<PathBuf> {
    std::fs::create_dir_all(path).map_err(|source| FixerError::CacheUnwritable {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::canonicalize(path).map_err(|source| FixerError::CacheUnwritable {
        path: path.to_path_buf(),
        source,
    })
}
