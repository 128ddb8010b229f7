//! Run a shell command line with piped stdin/stdout/stderr.
//!
//! Both output pipes are drained on their own reader threads while the parent
//! writes stdin, so a child that fills its stdout before consuming all of its
//! input cannot stall the exchange.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

/// The pipes to the child could not be set up.
pub const PIPE_FAILED: i32 = -1;
/// The shell could not be spawned.
pub const SPAWN_FAILED: i32 = -2;
/// Waiting for the child (or joining a reader thread) failed.
pub const WAIT_FAILED: i32 = -3;
/// The child was terminated by a signal instead of exiting.
pub const SIGNALED: i32 = -4;
/// Writing the input bytes to the child's stdin failed.
pub const STDIN_WRITE_FAILED: i32 = -5;

/// Destination for bytes read from a child stream.
pub trait ByteSink {
    fn clear(&mut self);
    fn append(&mut self, data: &[u8]);
}

impl ByteSink for Vec<u8> {
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn append(&mut self, data: &[u8]) {
        self.extend_from_slice(data);
    }
}

/// Text sink. Invalid UTF-8 is replaced rather than rejected.
impl ByteSink for String {
    fn clear(&mut self) {
        String::clear(self);
    }

    fn append(&mut self, data: &[u8]) {
        self.push_str(&String::from_utf8_lossy(data));
    }
}

pub fn run_command<O, E>(cmd: &str, stdout: &mut O, stderr: &mut E) -> i32
where
    O: ByteSink + ?Sized,
    E: ByteSink + ?Sized,
{
    run_command_sink(cmd, None, stdout, stderr)
}

pub fn run_command_with_stdin<O, E>(
    input: &str,
    cmd: &str,
    stdout: &mut O,
    stderr: &mut E,
) -> i32
where
    O: ByteSink + ?Sized,
    E: ByteSink + ?Sized,
{
    run_command_sink(cmd, Some(input.as_bytes()), stdout, stderr)
}

/// Run `cmd` through the host shell and return its exit code, or one of the
/// negative sentinels above when the process machinery itself failed.
pub fn run_command_sink<O, E>(
    cmd: &str,
    input: Option<&[u8]>,
    stdout: &mut O,
    stderr: &mut E,
) -> i32
where
    O: ByteSink + ?Sized,
    E: ByteSink + ?Sized,
{
    stdout.clear();
    stderr.clear();

    let mut child = match shell(cmd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            log::warn!("failed to spawn `{cmd}`: {e}");
            return SPAWN_FAILED;
        }
    };

    let Some((mut stdin, out_reader, err_reader)) = take_pipes(&mut child) else {
        reap(&mut child);
        return PIPE_FAILED;
    };

    let mut write_failed = false;
    if let Some(data) = input.filter(|d| !d.is_empty()) {
        match stdin.write_all(data) {
            Ok(()) => {}
            // The child quit without reading everything; its exit code says why.
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                log::debug!("`{cmd}` closed stdin early");
            }
            Err(e) => {
                log::warn!("failed to write stdin of `{cmd}`: {e}");
                write_failed = true;
            }
        }
    }
    // EOF for the child.
    drop(stdin);

    let out = join_reader(out_reader);
    let err = join_reader(err_reader);

    let status = match child.wait() {
        Ok(status) => status,
        Err(e) => {
            log::warn!("failed to wait for `{cmd}`: {e}");
            return WAIT_FAILED;
        }
    };
    let (Some(out), Some(err)) = (out, err) else {
        return WAIT_FAILED;
    };
    stdout.append(&out);
    stderr.append(&err);

    if write_failed {
        return STDIN_WRITE_FAILED;
    }
    status.code().unwrap_or(SIGNALED)
}

// Passed raw: std's argument quoting would turn the `"` around paths into `\"`.
#[cfg(windows)]
fn shell(cmd: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let mut command = Command::new("cmd");
    command.arg("/C").raw_arg(cmd);
    command
}

#[cfg(not(windows))]
fn shell(cmd: &str) -> Command {
    let mut command = Command::new("/bin/sh");
    command.args(["-c", cmd]);
    command
}

type Pipes = (
    std::process::ChildStdin,
    JoinHandle<std::io::Result<Vec<u8>>>,
    JoinHandle<std::io::Result<Vec<u8>>>,
);

fn take_pipes(child: &mut Child) -> Option<Pipes> {
    let stdin = child.stdin.take()?;
    let stdout = child.stdout.take()?;
    let stderr = child.stderr.take()?;
    Some((stdin, spawn_reader(stdout), spawn_reader(stderr)))
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Option<Vec<u8>> {
    match handle.join() {
        Ok(Ok(buf)) => Some(buf),
        Ok(Err(e)) => {
            log::warn!("error reading child output: {e}");
            None
        }
        Err(_) => {
            log::warn!("child output reader panicked");
            None
        }
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
