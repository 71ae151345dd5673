//! External process execution.
//!
//! Two shapes of invocation are supported:
//!
//! - [`ToolCommand`]: one process, stdout and stderr captured.
//! - [`run_pipeline`]: two processes where the first stage's stdout feeds the
//!   second stage's stdin.
//!
//! Every child is spawned with `kill_on_drop`, and every wait races the
//! caller's [`CancellationToken`](tokio_util::sync::CancellationToken), so a
//! cancelled wait terminates the children instead of orphaning them.

mod command;
mod error;
mod pipeline;

pub use command::{ToolCommand, ToolOutput};
pub use error::ProcessError;
pub use pipeline::{run_pipeline, PipelineError, PipelineSide, PipelineStage};

use std::ffi::OsString;
use std::path::Path;

/// Renders a program and its arguments as a single line for logs and errors.
pub(crate) fn render_command_line(program: &Path, args: &[OsString]) -> String {
    let mut line = program.to_string_lossy().into_owned();
    for arg in args {
        line.push(' ');
        let arg = arg.to_string_lossy();
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('\'');
            line.push_str(&arg);
            line.push('\'');
        } else {
            line.push_str(&arg);
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command_line_quotes_spaces() {
        let line = render_command_line(
            Path::new("fdkaac"),
            &[
                OsString::from("-"),
                OsString::from("-o"),
                OsString::from("/tmp/out/01 - A.m4a"),
            ],
        );
        assert_eq!(line, "fdkaac - -o '/tmp/out/01 - A.m4a'");
    }

    #[test]
    fn test_render_command_line_no_args() {
        assert_eq!(render_command_line(Path::new("ffprobe"), &[]), "ffprobe");
    }
}
