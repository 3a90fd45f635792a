use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::core::error::{FixerError, FixerResult};

const APP_DIR_NAME: &str = "fix_lwjgl";
const CONFIG_FILE: &str = "config.json";

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "FIX_LWJGL_CONFIG";

const FIELDS: &[&str] = &[
    "lwjgl_base_path",
    "can_download",
    "download_timeout_secs",
    "max_concurrent_downloads",
    "download_retries",
    "verify_checksums",
    "lwjgl3_repository",
    "lwjgl2_repository",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixerConfig {
    /// Parent of the `lwjgl_{generation}{arch}` cache directories.
    pub lwjgl_base_path: PathBuf,
    pub can_download: bool,
    pub download_timeout_secs: u64,
    pub max_concurrent_downloads: usize,
    pub download_retries: u32,
    pub verify_checksums: bool,
    pub lwjgl3_repository: String,
    pub lwjgl2_repository: String,
}

impl Default for FixerConfig {
    fn default() -> Self {
        Self {
            lwjgl_base_path: default_base_dir().join(APP_DIR_NAME),
            can_download: true,
            download_timeout_secs: 60,
            max_concurrent_downloads: 8,
            download_retries: 2,
            verify_checksums: true,
            lwjgl3_repository: "https://build.lwjgl.org/release".into(),
            lwjgl2_repository: "https://raw.githubusercontent.com/CoolCat467/fix-lwjgl/HEAD".into(),
        }
    }
}

impl FixerConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    fn validate(&self, path: &Path) -> FixerResult<()> {
        let reason = if self.download_timeout_secs == 0 {
            "download_timeout_secs must be greater than zero"
        } else if self.max_concurrent_downloads == 0 {
            "max_concurrent_downloads must be greater than zero"
        } else if self.lwjgl_base_path.as_os_str().is_empty() {
            "lwjgl_base_path must not be empty"
        } else {
            return Ok(());
        };
        Err(FixerError::Config {
            path: path.to_path_buf(),
            reason: reason.into(),
        })
    }
}

/// Config file location: `$FIX_LWJGL_CONFIG`, else the user config dir.
pub fn default_config_path() -> PathBuf {
    if let Some(custom) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return expand_home(Path::new(&custom));
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE)
}

/// Load the config, writing it back when the file is absent or lacks fields.
pub fn load_or_init(path: &Path) -> FixerResult<FixerConfig> {
    if !path.exists() {
        info!("Config file {:?} does not exist, writing defaults", path);
        let config = FixerConfig::default();
        save_settings(path, &config);
        return Ok(config);
    }

    let config_error = |reason: String| FixerError::Config {
        path: path.to_path_buf(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|source| FixerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|e| config_error(e.to_string()))?;
    let Some(fields) = document.as_object() else {
        return Err(config_error("top level must be a JSON object".into()));
    };
    let absent: Vec<&str> = FIELDS
        .iter()
        .copied()
        .filter(|field| !fields.contains_key(*field))
        .collect();

    let mut config: FixerConfig =
        serde_json::from_value(document).map_err(|e| config_error(e.to_string()))?;
    config.lwjgl_base_path = expand_home(&config.lwjgl_base_path);
    config.validate(path)?;

    if absent.is_empty() {
        info!("Loaded configuration from {:?}", path);
    } else {
        info!("Config file is missing {}; rewriting {:?}", absent.join(", "), path);
        save_settings(path, &config);
    }

    Ok(config)
}

/// Persist the config. A read-only config location never blocks a launch.
pub fn save_settings(path: &Path, config: &FixerConfig) {
    if let Err(err) = write_settings(path, config) {
        warn!("Could not write config file {:?}: {}", path, err);
    }
}

fn write_settings(path: &Path, config: &FixerConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
