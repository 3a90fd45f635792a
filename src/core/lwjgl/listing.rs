// ─── Bundle Listing ───
// The LWJGL 2 bundle is described by a nested `files.json` document:
// object keys are directories (`""` meaning "this directory") and arrays
// hold file names.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::core::error::{FixerError, FixerResult};

/// Parse a downloaded listing into relative file paths.
pub fn parse_listing(url: &str, bytes: &[u8]) -> FixerResult<Vec<PathBuf>> {
    let invalid = |reason: String| FixerError::InvalidListing {
        url: url.to_string(),
        reason,
    };

    let document: Value =
        serde_json::from_slice(bytes).map_err(|e| invalid(e.to_string()))?;
    let paths = flatten_listing(&document).map_err(invalid)?;
    if paths.is_empty() {
        return Err(invalid("listing names no files".into()));
    }
    Ok(paths)
}

/// Flatten a listing into relative paths, depth-first in key order.
///
/// Non-string array items are skipped. Paths that would escape the bundle
/// directory (absolute, `..`) are rejected.
pub fn flatten_listing(document: &Value) -> Result<Vec<PathBuf>, String> {
    let Value::Object(root) = document else {
        return Err("listing root is not an object".into());
    };

    let mut paths = Vec::new();
    // Depth-first; entries are pushed reversed so they pop in key order.
    let mut pending: Vec<(PathBuf, &Value)> = root
        .iter()
        .rev()
        .map(|(key, value)| (PathBuf::from(key), value))
        .collect();
    while let Some((dir, value)) = pending.pop() {
        match value {
            Value::Object(inner) => {
                for (key, child) in inner.iter().rev() {
                    pending.push((dir.join(key), child));
                }
            }
            Value::Array(files) => {
                for file in files.iter().filter_map(Value::as_str) {
                    let path = dir.join(file);
                    ensure_relative(&path)?;
                    paths.push(path);
                }
            }
            _ => return Err(format!("unexpected value under {:?}", dir)),
        }
    }

    Ok(paths)
}

fn ensure_relative(path: &Path) -> Result<(), String> {
    let escapes = path.as_os_str().is_empty()
        || path
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
    if escapes {
        return Err(format!("refusing listing path {:?}", path));
    }
    Ok(())
}

/// Listing path rendered as a URL suffix.
pub fn url_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_directories_are_flattened_in_order() {
        let listing = json!({
            "": ["main.py", "waffles.txt"],
            "folder": {
                "": ["folder_one.txt"],
                "inner": {
                    "": ["folder_two.txt"],
                    "inner_two": ["folder_three.txt"]
                }
            }
        });

        let expected: Vec<PathBuf> = vec![
            PathBuf::from("main.py"),
            PathBuf::from("waffles.txt"),
            Path::new("folder").join("folder_one.txt"),
            Path::new("folder").join("inner").join("folder_two.txt"),
            Path::new("folder")
                .join("inner")
                .join("inner_two")
                .join("folder_three.txt"),
        ];
        assert_eq!(flatten_listing(&listing).unwrap(), expected);
    }

    #[test]
    fn non_string_items_are_skipped() {
        let listing = json!({ "": ["liblwjgl.so", 7, null, "lwjgl.jar"] });
        assert_eq!(
            flatten_listing(&listing).unwrap(),
            vec![PathBuf::from("liblwjgl.so"), PathBuf::from("lwjgl.jar")]
        );
    }

    #[test]
    fn escaping_paths_are_rejected() {
        assert!(flatten_listing(&json!({ "..": ["passwd"] })).is_err());
        assert!(flatten_listing(&json!({ "": ["/etc/passwd"] })).is_err());
        assert!(flatten_listing(&json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn parse_listing_reports_the_source() {
        let err = parse_listing("https://example.org/files.json", b"{}").unwrap_err();
        assert!(matches!(err, FixerError::InvalidListing { .. }));
        assert!(err.to_string().contains("https://example.org/files.json"));

        let err = parse_listing("https://example.org/files.json", b"<html>").unwrap_err();
        assert!(matches!(err, FixerError::InvalidListing { .. }));
    }

    #[test]
    fn url_path_uses_forward_slashes() {
        let path = Path::new("natives").join("liblwjgl.so");
        assert_eq!(url_path(&path), "natives/liblwjgl.so");
    }
}
