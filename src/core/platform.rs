// ─── Platform Detection ───
// Maps the host OS and CPU to the tags LWJGL uses for native artifacts.

use std::fmt;
use std::sync::OnceLock;

use tracing::debug;

/// CPU architecture families LWJGL publishes natives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    X86_32,
    X86_64,
    Arm32,
    Arm64,
}

impl Architecture {
    /// Canonical short tag, used in cache directory names.
    pub fn tag(self) -> &'static str {
        match self {
            Architecture::X86_32 => "x86",
            Architecture::X86_64 => "x64",
            Architecture::Arm32 => "arm32",
            Architecture::Arm64 => "arm64",
        }
    }

    /// Map a machine string (`uname -m` style) to an architecture.
    ///
    /// Never fails: unrecognised values fall back by family and pointer
    /// width, so an unknown 64-bit ARM variant is `Arm64` and anything else
    /// unknown is x86 of the given width.
    pub fn from_machine(machine: &str, pointer_width: u32) -> Self {
        let machine = machine.trim().to_ascii_lowercase();
        match machine.as_str() {
            "x86_64" | "amd64" | "x64" => Architecture::X86_64,
            "i386" | "i486" | "i586" | "i686" | "x86" => Architecture::X86_32,
            "aarch64" | "aarch64_be" | "arm64" | "armv8" | "armv8b" | "armv8l" => {
                Architecture::Arm64
            }
            "arm" | "armhf" | "armv7" | "armv7b" | "armv7l" | "armv6l" => Architecture::Arm32,
            other => {
                let arm_family = other.starts_with("arm") || other.starts_with("aarch");
                match (arm_family, pointer_width >= 64) {
                    (true, true) => Architecture::Arm64,
                    (true, false) => Architecture::Arm32,
                    (false, true) => Architecture::X86_64,
                    (false, false) => Architecture::X86_32,
                }
            }
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Operating systems LWJGL publishes natives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOs {
    Linux,
    Windows,
    MacOs,
}

impl HostOs {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "windows" => HostOs::Windows,
            "macos" | "darwin" | "macosx" => HostOs::MacOs,
            _ => HostOs::Linux,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HostOs::Linux => "linux",
            HostOs::Windows => "windows",
            HostOs::MacOs => "macos",
        }
    }
}

/// Host OS + architecture, derived once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: HostOs,
    pub arch: Architecture,
}

impl Platform {
    pub fn new(os: HostOs, arch: Architecture) -> Self {
        Self { os, arch }
    }

    /// Classifier appended to `-natives-` in LWJGL 3 jar names.
    ///
    /// x86-64 is LWJGL's default and carries no architecture suffix.
    pub fn natives_classifier(&self) -> String {
        match self.arch {
            Architecture::X86_64 => self.os.as_str().to_string(),
            arch => format!("{}-{}", self.os.as_str(), arch.tag()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.as_str(), self.arch.tag())
    }
}

static HOST_PLATFORM: OnceLock<Platform> = OnceLock::new();

/// Detect the host platform. Memoized for the lifetime of the process.
pub fn detect() -> Platform {
    *HOST_PLATFORM.get_or_init(|| {
        let os = HostOs::from_name(std::env::consts::OS);
        let arch = Architecture::from_machine(std::env::consts::ARCH, usize::BITS);
        let platform = Platform::new(os, arch);
        debug!(
            "Detected platform {} (os={}, arch={})",
            platform,
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        platform
    })
}
