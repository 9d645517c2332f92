use std::{
  fs,
  io::Write,
  path::Path,
  process::{Child, Command, ExitStatus, Stdio},
  time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use wait_timeout::ChildExt as WaitExt;

/// Standard output and exit status of a finished process.
#[derive(Debug, Clone)]
pub struct Captured {
  pub status: ExitStatus,
  pub stdout: String,
}

impl Captured {
  /// Writes the captured standard output to stderr, for diagnosing a failed
  /// run.
  pub fn forward_to_stderr(&self) -> Result<()> {
    self.forward_to(std::io::stderr().lock())
  }

  pub fn forward_to<W: Write>(&self, mut out: W) -> Result<()> {
    out.write_all(self.stdout.as_bytes()).context("write")?;
    out.flush().context("flush")
  }
}

#[extend::ext]
pub impl ExitStatus {
  fn check_success(&self) -> Result<()> {
    if !self.success() {
      anyhow::bail!("exited with non-zero status {self}");
    }

    Ok(())
  }
}

#[extend::ext]
pub impl Child {
  fn is_running(&mut self) -> Result<bool> {
    Ok(self.try_wait().context("try_wait")?.is_none())
  }

  /// Waits up to `timeout` for the process to exit. Returns `Ok(true)` if it is
  /// still running afterwards.
  fn survives(&mut self, timeout: Duration) -> Result<bool> {
    Ok(self.wait_timeout(timeout).context("wait")?.is_none())
  }
}

#[extend::ext]
pub impl Command {
  fn check_success(&mut self) -> Result<()> {
    self.status().context("status")?.check_success()
  }

  /// Runs the command, capturing only stdout. stderr is passed through. A
  /// non-zero exit is not an error, callers decide what it means.
  fn capture(&mut self) -> Result<Captured> {
    let output = self.stderr(Stdio::inherit()).output().context("output")?;

    Ok(Captured {
      status: output.status,
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
  }

  /// Runs the command, capturing only stdout, returning an error on non-zero
  /// exit.
  fn status_stdout(&mut self) -> Result<String> {
    let captured = self.capture()?;
    captured.status.check_success()?;

    Ok(captured.stdout)
  }
}

#[extend::ext]
pub impl Path {
  fn modified(&self) -> Result<SystemTime> {
    fs::metadata(self)
      .and_then(|metadata| metadata.modified())
      .with_context(|| format!("mtime of {self:?}"))
  }

  fn is_newer_than(&self, other: &Path) -> Result<bool> {
    Ok(self.modified()? > other.modified()?)
  }
}

#[cfg(test)]
mod tests {
  use std::{fs::File, os::unix::process::ExitStatusExt as _};

  use tempfile::TempDir;

  use super::*;

  #[test]
  fn non_zero_status_is_an_error() {
    assert!(ExitStatus::from_raw(0).check_success().is_ok());
    assert!(ExitStatus::from_raw(1 << 8).check_success().is_err());
  }

  #[test]
  fn capture_keeps_failed_output() {
    let captured = Command::new("sh").args(["-c", "echo 1.5; exit 3"]).capture().unwrap();

    assert!(!captured.status.success());
    assert_eq!(captured.stdout, "1.5\n");
  }

  #[test]
  fn failed_output_is_forwarded() {
    let captured = Command::new("sh")
      .args(["-c", "echo banner; echo 1.5; exit 3"])
      .capture()
      .unwrap();

    let mut forwarded = Vec::new();
    captured.forward_to(&mut forwarded).unwrap();

    assert!(!captured.status.success());
    assert_eq!(String::from_utf8(forwarded).unwrap(), "banner\n1.5\n");
    assert!(captured.forward_to_stderr().is_ok());
  }

  #[test]
  fn status_stdout_rejects_failure() {
    assert_eq!(Command::new("echo").arg("hi").status_stdout().unwrap(), "hi\n");
    assert!(Command::new("false").status_stdout().is_err());
  }

  #[test]
  fn newer_by_mtime() {
    let dir = TempDir::new().unwrap();
    let old = dir.path().join("old");
    let new = dir.path().join("new");

    let now = SystemTime::now();
    File::create(&old).unwrap().set_modified(now - Duration::from_secs(60)).unwrap();
    File::create(&new).unwrap().set_modified(now).unwrap();

    assert!(new.is_newer_than(&old).unwrap());
    assert!(!old.is_newer_than(&new).unwrap());
    assert!(dir.path().join("missing").modified().is_err());
  }
}
