mod commands;
pub mod core;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::core::launch;
use crate::core::state::default_config_path;

/// Entry point of the `fix-lwjgl` wrapper command.
pub fn run() -> ExitCode {
    // Logs go to stderr; the game owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fix_lwjgl_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("fix-lwjgl v{} starting...", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = default_config_path();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("Failed to start async runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let prepared = runtime.block_on(commands::prepare_launch(args, &config_path));
    // Nothing may keep running in the background once the game takes over.
    drop(runtime);

    let launch_args = match prepared {
        Ok(Some(launch_args)) => launch_args,
        Ok(None) => return ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{}", err);
            tracing::error!("Not launching; rerun with -noop to skip LWJGL rewriting");
            return ExitCode::FAILURE;
        }
    };

    match launch::launch(&launch_args) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
