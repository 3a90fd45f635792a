use std::path::Path;

use tracing::{error, info};

use crate::core::error::FixerResult;
use crate::core::launch::RewriteEngine;
use crate::core::platform;
use crate::core::state::load_or_init;

/// First argument that disables every rewrite.
pub const NOOP_FLAG: &str = "-noop";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperAction {
    /// No command was given.
    Usage,
    /// Launch the remaining arguments untouched.
    Passthrough(Vec<String>),
    Rewrite(Vec<String>),
}

pub fn parse_wrapper_args(mut args: Vec<String>) -> WrapperAction {
    match args.first() {
        None => WrapperAction::Usage,
        Some(first) if first.eq_ignore_ascii_case(NOOP_FLAG) => {
            args.remove(0);
            WrapperAction::Passthrough(args)
        }
        Some(_) => WrapperAction::Rewrite(args),
    }
}

/// Turn wrapper arguments into the command to launch.
///
/// `Ok(None)` means there is nothing to launch and the usage hint was logged.
pub async fn prepare_launch(
    args: Vec<String>,
    config_path: &Path,
) -> FixerResult<Option<Vec<String>>> {
    match parse_wrapper_args(args) {
        WrapperAction::Usage => {
            error!("No java arguments to rewrite lwjgl class paths for!");
            error!("Make sure you are using `Wrapper Command` and not pre or post launch command!");
            Ok(None)
        }
        WrapperAction::Passthrough(args) => {
            info!("Not performing any class path rewrites, {} flag given.", NOOP_FLAG);
            Ok(Some(args))
        }
        WrapperAction::Rewrite(args) => {
            let config = load_or_init(config_path)?;
            let platform = platform::detect();
            info!("Host platform: {}", platform);

            let engine = RewriteEngine::from_config(&config, platform)?;
            engine.rewrite(args).await.map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_arguments_ask_for_usage() {
        assert_eq!(parse_wrapper_args(Vec::new()), WrapperAction::Usage);
    }

    #[test]
    fn noop_flag_is_case_insensitive_and_stripped() {
        assert_eq!(
            parse_wrapper_args(args(&["-NOOP", "java", "-cp", "a.jar"])),
            WrapperAction::Passthrough(args(&["java", "-cp", "a.jar"]))
        );
    }

    #[test]
    fn anything_else_is_rewritten() {
        assert_eq!(
            parse_wrapper_args(args(&["java", "-noop"])),
            WrapperAction::Rewrite(args(&["java", "-noop"]))
        );
    }

    #[tokio::test]
    async fn passthrough_never_reads_the_config() {
        let config = std::env::temp_dir()
            .join(format!("commands-test-noop-{}", std::process::id()))
            .join("config.json");

        let out = prepare_launch(args(&["-noop", "java", "Main"]), &config)
            .await
            .unwrap();

        assert_eq!(out, Some(args(&["java", "Main"])));
        assert!(!config.exists());
    }

    #[tokio::test]
    async fn rewrite_initialises_the_config_on_first_run() {
        let dir = std::env::temp_dir().join(format!("commands-test-rewrite-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config = dir.join("config.json");
        let cmd = args(&["java", "-jar", "server.jar"]);

        let out = prepare_launch(cmd.clone(), &config).await.unwrap();

        assert_eq!(out, Some(cmd));
        assert!(config.is_file());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn empty_arguments_launch_nothing() {
        let config = std::env::temp_dir().join("commands-test-unused.json");
        assert_eq!(prepare_launch(Vec::new(), &config).await.unwrap(), None);
    }
}
