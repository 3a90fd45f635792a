pub mod client;

pub use client::{DownloadTask, Downloader};
