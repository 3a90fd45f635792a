// ─── Process Launcher ───
// Hands the corrected command to the OS. On Unix the current process image
// is replaced; elsewhere the game runs as a child and its exit code is
// forwarded.

use std::process::Command;

use tracing::{debug, info};

use crate::core::error::{FixerError, FixerResult};

/// Launch `args[0]` with the remaining arguments.
///
/// Only returns on Unix if `exec` failed. On other platforms returns the
/// child's exit code.
pub fn launch(args: &[String]) -> FixerResult<i32> {
    let Some((program, rest)) = args.split_first() else {
        return Err(FixerError::Other("No program to launch".into()));
    };

    let mut cmd = Command::new(program);
    cmd.args(rest);

    info!("Launching minecraft from arguments...");
    debug!("Command (copy/paste): {}", format_command_for_logs(&cmd));

    run(cmd, program)
}

#[cfg(unix)]
fn run(mut cmd: Command, program: &str) -> FixerResult<i32> {
    use std::os::unix::process::CommandExt;

    let source = cmd.exec();
    Err(FixerError::Launch {
        program: program.to_string(),
        source,
    })
}

#[cfg(not(unix))]
fn run(mut cmd: Command, program: &str) -> FixerResult<i32> {
    let status = cmd.status().map_err(|source| FixerError::Launch {
        program: program.to_string(),
        source,
    })?;
    Ok(status.code().unwrap_or(1))
}

fn format_command_for_logs(cmd: &Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
