// ─── Argument Scanner ───
// Walks a Java launch command once, locating the classpath and native
// library path tokens and classifying every LWJGL entry on the classpath.

use tracing::{debug, warn};

use crate::core::lwjgl::manifest::V2_ONLY_ARTIFACTS;
use crate::core::lwjgl::{lookup, LibraryGeneration};

use super::version::generation_hint;

const CLASSPATH_FLAGS: &[&str] = &["-cp", "-classpath", "--class-path"];
pub const LWJGL_LIBRARY_PATH_FLAG: &str = "-Dorg.lwjgl.librarypath=";
const GAME_VERSION_FLAG: &str = "--version";
const NATIVES_MARKER: &str = "-natives-";

/// Platform-specific Java classpath separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// One segment of the classpath token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClasspathEntry {
    pub raw: String,
    pub generation: Option<LibraryGeneration>,
    /// Artifact name, e.g. `lwjgl-glfw`.
    pub module: Option<String>,
    /// Release the entry was built from, when the path carries one.
    pub version: Option<String>,
    /// Whether this is a natives jar.
    pub natives: bool,
}

impl ClasspathEntry {
    fn unrelated(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            generation: None,
            module: None,
            version: None,
            natives: false,
        }
    }

    pub fn is_lwjgl(&self) -> bool {
        self.generation.is_some()
    }
}

/// Conflicting signals found while scanning. Resolved by policy, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAnomaly {
    /// Both LWJGL 2 and LWJGL 3 entries are on the classpath; LWJGL 3 wins.
    MixedGenerations,
    /// An LWJGL 3 artifact the manifest has no row for.
    UnknownModule(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub classpath_flag_index: Option<usize>,
    pub classpath_index: Option<usize>,
    /// Last `-Dorg.lwjgl.librarypath=` token.
    pub native_path_index: Option<usize>,
    pub entries: Vec<ClasspathEntry>,
    pub generation: Option<LibraryGeneration>,
    /// Value of `--version`, if the game arguments carry one.
    pub game_version: Option<String>,
    pub anomalies: Vec<ScanAnomaly>,
}

/// Scan launch tokens left to right. Never fails: a command without LWJGL
/// references yields `generation == None`.
pub fn scan(tokens: &[String]) -> ScanResult {
    let mut result = ScanResult::default();
    let mut bare_classpath = None;

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();

        if CLASSPATH_FLAGS.contains(&token) {
            if i + 1 < tokens.len() && result.classpath_index.is_none() {
                result.classpath_flag_index = Some(i);
                result.classpath_index = Some(i + 1);
            }
            i += 2;
            continue;
        }

        if token == GAME_VERSION_FLAG {
            if let Some(value) = tokens.get(i + 1) {
                result.game_version = Some(value.clone());
            }
            i += 2;
            continue;
        }

        if token.starts_with(LWJGL_LIBRARY_PATH_FLAG) {
            result.native_path_index = Some(i);
        } else if bare_classpath.is_none() && looks_like_bare_classpath(token) {
            bare_classpath = Some(i);
        }
        i += 1;
    }

    if result.classpath_index.is_none() {
        result.classpath_index = bare_classpath;
    }

    let hint = result.game_version.as_deref().map(generation_hint);
    if let Some(index) = result.classpath_index {
        result.entries = tokens[index]
            .split(get_classpath_separator())
            .filter(|segment| !segment.is_empty())
            .map(|segment| classify_entry(segment, hint))
            .collect();
    }

    for entry in &result.entries {
        if entry.generation != Some(LibraryGeneration::V3) {
            continue;
        }
        if let Some(module) = &entry.module {
            if lookup(LibraryGeneration::V3, module).is_none() {
                let anomaly = ScanAnomaly::UnknownModule(module.clone());
                if !result.anomalies.contains(&anomaly) {
                    result.anomalies.push(anomaly);
                }
            }
        }
    }

    let has_v3 = result.entries.iter().any(|e| e.generation == Some(LibraryGeneration::V3));
    let has_v2 = result.entries.iter().any(|e| e.generation == Some(LibraryGeneration::V2));

    result.generation = if has_v3 {
        if has_v2 {
            warn!("Classpath mixes LWJGL 2 and LWJGL 3 entries; treating it as LWJGL 3");
            result.anomalies.push(ScanAnomaly::MixedGenerations);
        }
        Some(LibraryGeneration::V3)
    } else if has_v2 || result.native_path_index.is_some() {
        Some(LibraryGeneration::V2)
    } else {
        None
    };

    debug!(
        "Scanned {} tokens: classpath={:?} librarypath={:?} generation={:?}",
        tokens.len(),
        result.classpath_index,
        result.native_path_index,
        result.generation
    );

    result
}

fn looks_like_bare_classpath(token: &str) -> bool {
    !token.starts_with('-')
        && token.contains(get_classpath_separator())
        && token.to_ascii_lowercase().contains("lwjgl")
}

/// Classify one classpath segment by its directory layout, then by its name.
pub fn classify_entry(raw: &str, hint: Option<LibraryGeneration>) -> ClasspathEntry {
    let components: Vec<&str> = raw.split(['/', '\\']).filter(|c| !c.is_empty()).collect();
    let Some(file_name) = components.last() else {
        return ClasspathEntry::unrelated(raw);
    };
    let natives = file_name.contains(NATIVES_MARKER);

    // Maven layout: .../lwjgl-glfw/3.3.1/lwjgl-glfw-3.3.1.jar
    if let [.., artifact, version, file] = components.as_slice() {
        let artifact_file = file.starts_with(&format!("{artifact}-{version}"));
        if artifact.starts_with("lwjgl") && starts_with_digit(version) && artifact_file {
            if let Some(generation) = LibraryGeneration::from_release(version) {
                return ClasspathEntry {
                    raw: raw.to_string(),
                    generation: Some(generation),
                    module: Some(artifact.to_string()),
                    version: Some(version.to_string()),
                    natives,
                };
            }
        }
    }

    classify_file_name(raw, file_name, natives, hint)
}

fn classify_file_name(
    raw: &str,
    file_name: &str,
    natives: bool,
    hint: Option<LibraryGeneration>,
) -> ClasspathEntry {
    let Some(stem) = file_name.strip_suffix(".jar") else {
        return ClasspathEntry::unrelated(raw);
    };
    let stem = stem.split(NATIVES_MARKER).next().unwrap_or(stem);

    // Repackaged names: lwjglv3-glfw.jar
    for (prefix, generation) in [
        ("lwjglv3", LibraryGeneration::V3),
        ("lwjglv2", LibraryGeneration::V2),
    ] {
        if let Some(rest) = stem.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with('-') {
                return ClasspathEntry {
                    raw: raw.to_string(),
                    generation: Some(generation),
                    module: Some(format!("lwjgl{rest}")),
                    version: None,
                    natives,
                };
            }
        }
    }

    if !stem.starts_with("lwjgl") {
        return ClasspathEntry::unrelated(raw);
    }

    // Versioned names: lwjgl-glfw-3.3.1.jar, lwjgl_util-2.9.4.jar
    let segments: Vec<&str> = stem.split('-').collect();
    if let Some(pos) = segments.iter().position(|s| starts_with_digit(s)) {
        if pos > 0 {
            let version = segments[pos..].join("-");
            return ClasspathEntry {
                raw: raw.to_string(),
                generation: LibraryGeneration::from_release(&version),
                module: Some(segments[..pos].join("-")),
                version: Some(version),
                natives,
            };
        }
    }

    let generation = if V2_ONLY_ARTIFACTS.contains(&stem) {
        LibraryGeneration::V2
    } else if stem == "lwjgl" {
        hint.unwrap_or(LibraryGeneration::V3)
    } else if stem.starts_with("lwjgl-") {
        LibraryGeneration::V3
    } else {
        return ClasspathEntry::unrelated(raw);
    };

    ClasspathEntry {
        raw: raw.to_string(),
        generation: Some(generation),
        module: Some(stem.to_string()),
        version: None,
        natives,
    }
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}
