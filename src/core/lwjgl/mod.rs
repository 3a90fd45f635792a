pub mod listing;
pub mod manifest;

use std::fmt;

pub use listing::parse_listing;
pub use manifest::{lookup, modules_for, EntryKind, ManifestEntry, LWJGL3_RELEASE};

/// Major incompatible LWJGL release lines, each with its own file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LibraryGeneration {
    V2,
    V3,
}

impl LibraryGeneration {
    /// Major version number, as used in cache directory names.
    pub fn number(self) -> u32 {
        match self {
            LibraryGeneration::V2 => 2,
            LibraryGeneration::V3 => 3,
        }
    }

    /// Generation for a release version string such as `3.3.1` or
    /// `2.9.4-nightly-20150209`.
    pub fn from_release(version: &str) -> Option<Self> {
        let major = version
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|part| part.parse::<u32>().ok())?;
        match major {
            2 => Some(LibraryGeneration::V2),
            3 => Some(LibraryGeneration::V3),
            _ => None,
        }
    }
}

impl fmt::Display for LibraryGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LWJGL {}", self.number())
    }
}
