// ─── LWJGL Module Manifest ───
// Compiled-in table of the files each generation needs per platform.
// Supporting a new module or architecture means adding a row here.

use crate::core::platform::{Architecture, Platform};

use super::LibraryGeneration;

/// The single LWJGL 3 release this table describes.
pub const LWJGL3_RELEASE: &str = "3.3.3";

const PLATFORM_PLACEHOLDER: &str = "{platform}";

/// What a manifest row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// One LWJGL 3 module: a base jar and, for most modules, a natives jar.
    Module {
        base_file: &'static str,
        native_template: Option<&'static str>,
    },
    /// The whole LWJGL 2 bundle, described by a remote `files.json` listing.
    Bundle {
        listing_file: &'static str,
        architectures: &'static [Architecture],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestEntry {
    pub module: &'static str,
    pub generation: LibraryGeneration,
    pub kind: EntryKind,
}

const fn module(
    name: &'static str,
    base_file: &'static str,
    native_template: Option<&'static str>,
) -> ManifestEntry {
    ManifestEntry {
        module: name,
        generation: LibraryGeneration::V3,
        kind: EntryKind::Module {
            base_file,
            native_template,
        },
    }
}

static V3_MODULES: &[ManifestEntry] = &[
    module("lwjgl", "lwjgl.jar", Some("lwjgl-natives-{platform}.jar")),
    module("lwjgl-assimp", "lwjgl-assimp.jar", Some("lwjgl-assimp-natives-{platform}.jar")),
    module("lwjgl-bgfx", "lwjgl-bgfx.jar", Some("lwjgl-bgfx-natives-{platform}.jar")),
    module("lwjgl-freetype", "lwjgl-freetype.jar", Some("lwjgl-freetype-natives-{platform}.jar")),
    module("lwjgl-glfw", "lwjgl-glfw.jar", Some("lwjgl-glfw-natives-{platform}.jar")),
    module("lwjgl-jemalloc", "lwjgl-jemalloc.jar", Some("lwjgl-jemalloc-natives-{platform}.jar")),
    module("lwjgl-lz4", "lwjgl-lz4.jar", Some("lwjgl-lz4-natives-{platform}.jar")),
    module("lwjgl-nanovg", "lwjgl-nanovg.jar", Some("lwjgl-nanovg-natives-{platform}.jar")),
    module("lwjgl-nuklear", "lwjgl-nuklear.jar", Some("lwjgl-nuklear-natives-{platform}.jar")),
    module("lwjgl-openal", "lwjgl-openal.jar", Some("lwjgl-openal-natives-{platform}.jar")),
    module("lwjgl-opengl", "lwjgl-opengl.jar", Some("lwjgl-opengl-natives-{platform}.jar")),
    module("lwjgl-opengles", "lwjgl-opengles.jar", Some("lwjgl-opengles-natives-{platform}.jar")),
    module("lwjgl-opus", "lwjgl-opus.jar", Some("lwjgl-opus-natives-{platform}.jar")),
    module("lwjgl-rpmalloc", "lwjgl-rpmalloc.jar", Some("lwjgl-rpmalloc-natives-{platform}.jar")),
    module("lwjgl-shaderc", "lwjgl-shaderc.jar", Some("lwjgl-shaderc-natives-{platform}.jar")),
    module("lwjgl-stb", "lwjgl-stb.jar", Some("lwjgl-stb-natives-{platform}.jar")),
    module("lwjgl-tinyfd", "lwjgl-tinyfd.jar", Some("lwjgl-tinyfd-natives-{platform}.jar")),
    module("lwjgl-zstd", "lwjgl-zstd.jar", Some("lwjgl-zstd-natives-{platform}.jar")),
    module("lwjgl-egl", "lwjgl-egl.jar", None),
    module("lwjgl-jawt", "lwjgl-jawt.jar", None),
    module("lwjgl-opencl", "lwjgl-opencl.jar", None),
];

static V2_BUNDLE: &[ManifestEntry] = &[ManifestEntry {
    module: "lwjgl2-bundle",
    generation: LibraryGeneration::V2,
    kind: EntryKind::Bundle {
        listing_file: "files.json",
        architectures: &[Architecture::Arm32, Architecture::Arm64],
    },
}];

/// Artifact names that only exist in LWJGL 2.
pub const V2_ONLY_ARTIFACTS: &[&str] = &["lwjgl_util", "lwjgl-platform"];

/// All manifest rows for a generation.
pub fn modules_for(generation: LibraryGeneration) -> &'static [ManifestEntry] {
    match generation {
        LibraryGeneration::V2 => V2_BUNDLE,
        LibraryGeneration::V3 => V3_MODULES,
    }
}

/// Row for a single module, if the table knows it.
pub fn lookup(generation: LibraryGeneration, module: &str) -> Option<&'static ManifestEntry> {
    modules_for(generation)
        .iter()
        .find(|entry| entry.module == module)
}

impl ManifestEntry {
    /// Base jar name, for module rows.
    pub fn base_file(&self) -> Option<&'static str> {
        match self.kind {
            EntryKind::Module { base_file, .. } => Some(base_file),
            EntryKind::Bundle { .. } => None,
        }
    }

    /// Natives jar name with the platform placeholder substituted.
    pub fn native_file(&self, platform: &Platform) -> Option<String> {
        match self.kind {
            EntryKind::Module {
                native_template: Some(template),
                ..
            } => Some(template.replace(PLATFORM_PLACEHOLDER, &platform.natives_classifier())),
            _ => None,
        }
    }

    /// Files this row contributes to the cache directory, base jar first.
    pub fn file_names(&self, platform: &Platform) -> Vec<String> {
        let mut names = Vec::with_capacity(2);
        if let Some(base) = self.base_file() {
            names.push(base.to_string());
        }
        if let Some(native) = self.native_file(platform) {
            names.push(native);
        }
        names
    }

    /// Download URL of one of this module's files under `repository`.
    pub fn module_file_url(&self, repository: &str, file_name: &str) -> String {
        format!(
            "{}/{}/bin/{}/{}",
            repository.trim_end_matches('/'),
            LWJGL3_RELEASE,
            self.module,
            file_name
        )
    }

    /// Whether a bundle row is published for `arch`. Module rows always are.
    pub fn supports(&self, arch: Architecture) -> bool {
        match self.kind {
            EntryKind::Module { .. } => true,
            EntryKind::Bundle { architectures, .. } => architectures.contains(&arch),
        }
    }

    /// Remote directory holding the bundle for `arch`.
    pub fn bundle_base_url(&self, repository: &str, arch: Architecture) -> String {
        format!("{}/lwjgl2{}", repository.trim_end_matches('/'), arch.tag())
    }

    /// URL of the bundle's file listing for `arch`.
    pub fn bundle_listing_url(&self, repository: &str, arch: Architecture) -> Option<String> {
        match self.kind {
            EntryKind::Bundle { listing_file, .. } => Some(format!(
                "{}/{}",
                self.bundle_base_url(repository, arch),
                listing_file
            )),
            EntryKind::Module { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::HostOs;

    #[test]
    fn v2_is_a_single_bundle_entry() {
        let entries = modules_for(LibraryGeneration::V2);
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].kind, EntryKind::Bundle { .. }));
        assert!(entries[0].supports(Architecture::Arm64));
        assert!(!entries[0].supports(Architecture::X86_64));
    }

    #[test]
    fn v3_rows_are_unique_and_follow_the_jar_naming_convention() {
        let entries = modules_for(LibraryGeneration::V3);
        let mut seen = std::collections::HashSet::new();
        for entry in entries {
            assert!(seen.insert(entry.module), "duplicate row {}", entry.module);
            assert_eq!(entry.generation, LibraryGeneration::V3);
            assert_eq!(entry.base_file(), Some(format!("{}.jar", entry.module).as_str()));
        }
    }

    #[test]
    fn native_template_is_resolved_per_platform() {
        let glfw = lookup(LibraryGeneration::V3, "lwjgl-glfw").unwrap();
        let arm = Platform::new(HostOs::Linux, Architecture::Arm64);
        assert_eq!(
            glfw.file_names(&arm),
            vec!["lwjgl-glfw.jar", "lwjgl-glfw-natives-linux-arm64.jar"]
        );

        let x64 = Platform::new(HostOs::Windows, Architecture::X86_64);
        assert_eq!(
            glfw.native_file(&x64).as_deref(),
            Some("lwjgl-glfw-natives-windows.jar")
        );
    }

    #[test]
    fn java_only_modules_have_no_natives() {
        let egl = lookup(LibraryGeneration::V3, "lwjgl-egl").unwrap();
        let arm = Platform::new(HostOs::Linux, Architecture::Arm32);
        assert_eq!(egl.file_names(&arm), vec!["lwjgl-egl.jar"]);
    }

    #[test]
    fn urls_follow_the_release_layout() {
        let glfw = lookup(LibraryGeneration::V3, "lwjgl-glfw").unwrap();
        assert_eq!(
            glfw.module_file_url("https://build.lwjgl.org/release/", "lwjgl-glfw.jar"),
            format!("https://build.lwjgl.org/release/{LWJGL3_RELEASE}/bin/lwjgl-glfw/lwjgl-glfw.jar")
        );

        let bundle = &modules_for(LibraryGeneration::V2)[0];
        assert_eq!(
            bundle
                .bundle_listing_url("https://example.org/repo", Architecture::Arm32)
                .as_deref(),
            Some("https://example.org/repo/lwjgl2arm32/files.json")
        );
    }

    #[test]
    fn unknown_modules_are_not_found() {
        assert!(lookup(LibraryGeneration::V3, "lwjgl-vulkan-x").is_none());
        assert!(lookup(LibraryGeneration::V2, "lwjgl-glfw").is_none());
    }
}
