use crate::error::{Error, Result};
use std::path::Path;
use std::process::Stdio;

/// Open `path` with the desktop's default application for its type.
///
/// Under WSL `xdg-open` and friends are known to report failure after the
/// Windows side has already opened the file, so there a failed launch counts
/// as success as long as the file exists. This can hide a real viewer failure.
pub fn view(path: impl AsRef<Path>, quiet: bool) -> Result<()> {
    let path = path.as_ref();
    let mut failure = None;

    for mut cmd in open::commands(path) {
        let program = cmd.get_program().to_string_lossy().into_owned();
        cmd.stdin(Stdio::null()).stdout(Stdio::null());
        if quiet {
            cmd.stderr(Stdio::null());
        }
        match cmd.status() {
            Ok(status) if status.success() => {
                log::debug!("opened {} with {program}", path.display());
                return Ok(());
            }
            Ok(status) => failure = Some(format!("{program} exited with {status}")),
            // Launcher not installed; try the next one.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => failure = Some(format!("{program}: {e}")),
        }
    }

    let failure = failure.unwrap_or_else(|| "no launcher available on this platform".to_string());
    settle_failure(path, failure, is_running_under_wsl())
}

fn settle_failure(path: &Path, failure: String, under_wsl: bool) -> Result<()> {
    if !under_wsl {
        return Err(Error::Viewer(failure));
    }
    if path.exists() {
        log::warn!("ignoring viewer failure under WSL ({failure}); {} exists", path.display());
        Ok(())
    } else {
        Err(Error::FileNotFound(path.to_path_buf()))
    }
}

fn is_running_under_wsl() -> bool {
    std::fs::read_to_string("/proc/version")
        .map(|version| mentions_wsl(&version))
        .unwrap_or(false)
}

fn mentions_wsl(version: &str) -> bool {
    version.lines().next().is_some_and(|line| line.contains("WSL"))
}
