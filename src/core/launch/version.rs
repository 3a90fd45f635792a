// ─── Game Version Hint ───
// Guesses which LWJGL generation a Minecraft version string shipped with.

use crate::core::lwjgl::LibraryGeneration;

/// First snapshot that moved to LWJGL 3 (17w43b).
const FIRST_V3_SNAPSHOT: [u32; 2] = [17, 43];
/// First release that moved to LWJGL 3 (1.13).
const FIRST_V3_RELEASE: [u32; 2] = [1, 13];

fn parse_numeric_version_parts(raw: &str) -> Vec<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.parse::<u32>().ok())
        .collect()
}

/// LWJGL generation a game version most likely uses.
///
/// Snapshot ids (`17w43b`) are compared against the first LWJGL 3 snapshot,
/// everything else against the first LWJGL 3 release. Numeric groups are
/// compared lexicographically, so `1.13` and `1.13.0` both count as LWJGL 3.
pub fn generation_hint(game_version: &str) -> LibraryGeneration {
    let parts = parse_numeric_version_parts(game_version);
    let threshold: &[u32] = if game_version.contains('w') {
        &FIRST_V3_SNAPSHOT
    } else {
        &FIRST_V3_RELEASE
    };

    if parts.as_slice() >= threshold {
        LibraryGeneration::V3
    } else {
        LibraryGeneration::V2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_switch_at_17w43b() {
        assert_eq!(generation_hint("17w43b"), LibraryGeneration::V3);
        assert_eq!(generation_hint("17w42b"), LibraryGeneration::V2);
        assert_eq!(generation_hint("23w31a"), LibraryGeneration::V3);
    }

    #[test]
    fn releases_switch_at_1_13() {
        assert_eq!(generation_hint("1.12.2"), LibraryGeneration::V2);
        assert_eq!(generation_hint("1.13.0"), LibraryGeneration::V3);
        assert_eq!(generation_hint("1.13"), LibraryGeneration::V3);
        assert_eq!(generation_hint("1.7.10"), LibraryGeneration::V2);
        assert_eq!(generation_hint("1.20.1"), LibraryGeneration::V3);
    }

    #[test]
    fn unparseable_versions_count_as_legacy() {
        assert_eq!(generation_hint("Legacy Minecraft"), LibraryGeneration::V2);
        assert_eq!(generation_hint(""), LibraryGeneration::V2);
    }
}
