//! Hand a file or folder to the desktop's default application.

use std::path::Path;
use std::process::Command;

use anyhow::Context;

#[cfg(target_os = "windows")]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("explorer");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

/// Launch the viewer without waiting for it to exit.
pub fn open_path(path: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(path.exists(), "{} does not exist", path.display());
    tracing::debug!(path = %path.display(), "opening");
    opener(path)
        .spawn()
        .with_context(|| format!("could not open {}", path.display()))?;
    Ok(())
}
