pub mod process;
pub mod rewrite;
pub mod scanner;
pub mod version;

pub use process::launch;
pub use rewrite::{RewriteEngine, RewriteOptions};
pub use scanner::{scan, ClasspathEntry, ScanAnomaly, ScanResult};
