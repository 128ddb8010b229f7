use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required option is missing or two options contradict each other.
    #[error("missing required argument: {0}")]
    RequiredArgument(String),

    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("file already exists: {}", .0.display())]
    FileExists(PathBuf),

    #[error("file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The engine ran but exited with a non-zero code (or could not be run at
    /// all, in which case `code` is one of the negative sentinels from
    /// [`crate::process`]).
    #[error("{}", called_process_message(.code, .command, .stdout, .stderr))]
    CalledProcess {
        code: i32,
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("failed to open viewer: {0}")]
    Viewer(String),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn called_process_message(code: &i32, command: &str, stdout: &str, stderr: &str) -> String {
    let mut msg = format!("command `{command}` exited with code {code}");
    if !stderr.is_empty() {
        msg.push_str("\nstderr: ");
        msg.push_str(stderr);
    }
    if !stdout.is_empty() {
        msg.push_str("\nstdout: ");
        msg.push_str(stdout);
    }
    msg
}
