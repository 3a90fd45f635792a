use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the rewrite pipeline.
/// Every module returns `Result<T, FixerError>`.
#[derive(Debug, Error)]
pub enum FixerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Cache ───────────────────────────────────────────
    #[error("LWJGL cache directory {path:?} cannot be created: {source}")]
    CacheUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "LWJGL files missing from {directory:?} ({}) and downloading is disabled in the configuration",
        .files.join(", ")
    )]
    DownloadDisabled {
        directory: PathBuf,
        files: Vec<String>,
    },

    #[error("No LWJGL {generation} bundle is published for {architecture}; populate {directory:?} manually or run with -noop")]
    BundleUnavailable {
        generation: u32,
        architecture: String,
        directory: PathBuf,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {module} from {url} failed: {cause}")]
    DownloadFailed {
        module: String,
        url: String,
        cause: String,
    },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {module} from {url} ({path:?}): expected {expected}, got {actual}")]
    ChecksumMismatch {
        module: String,
        url: String,
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Invalid bundle listing from {url}: {reason}")]
    InvalidListing { url: String, reason: String },

    // ── Configuration ───────────────────────────────────
    #[error("Configuration error in {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    // ── Launch ──────────────────────────────────────────
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type FixerResult<T> = Result<T, FixerError>;

impl From<std::io::Error> for FixerError {
    fn from(source: std::io::Error) -> Self {
        FixerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
