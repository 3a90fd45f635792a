// ─── fix-lwjgl Core ───
// Rewrites a Minecraft launch command so LWJGL loads files built for the
// host architecture.
//
// Architecture:
//   core/
//     platform     Host OS + CPU detection
//     lwjgl/       Module manifest + LWJGL 2 bundle listings
//     cache/       Per-(generation, arch) cache directories
//     downloader/  Concurrent, atomic, SHA-1 checked downloads
//     launch/      Argument scanner, rewrite engine, process launcher
//     state/       JSON configuration

pub mod cache;
pub mod downloader;
pub mod error;
pub mod http;
pub mod launch;
pub mod lwjgl;
pub mod platform;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
