use std::{
  process::{Child, Command, Stdio},
  time::Duration,
};

use anyhow::{Context, Result};

use crate::ext::ChildExt as _;

/// A helper process that lives for one measurement window. Dropping the guard
/// kills and reaps the process, on error paths too.
pub struct BackgroundServer {
  child: Child,
}

impl BackgroundServer {
  pub fn spawn(command: &mut Command) -> Result<Self> {
    tracing::debug!("(background) {command:?}");

    let child = command
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()
      .context("spawn")?;

    Ok(Self { child })
  }

  /// Gives the server `startup` to come up. Returns early with `false` if it
  /// exits in the meantime.
  pub fn settle(&mut self, startup: Duration) -> Result<bool> {
    self.child.survives(startup)
  }

  pub fn is_running(&mut self) -> Result<bool> {
    self.child.is_running()
  }
}

impl Drop for BackgroundServer {
  fn drop(&mut self) {
    if let Err(err) = self.child.kill() {
      tracing::debug!("kill background server: {err}");
    }

    if let Err(err) = self.child.wait() {
      tracing::warn!("wait for background server: {err}");
    }
  }
}
