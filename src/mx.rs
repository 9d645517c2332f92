use std::{
  path::{Path, PathBuf},
  process::Command,
};

use anyhow::{Context, Result};

use crate::ext::CommandExt as _;

/// Binaries are only deployed from this branch.
pub const DEPLOY_BRANCH: &str = "deploy-snapshots";

const TRUFFLE_API_JAR: &str = "truffle-api.jar";

/// The `mx` orchestrator, run in the suite directory.
fn mx(suite_dir: &Path) -> Command {
  let mut mx = Command::new("mx");
  mx.current_dir(suite_dir);

  mx
}

/// The Truffle API jar and the rest of the runtime classpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classpath {
  pub truffle_api: PathBuf,
  pub entries: Vec<String>,
}

pub fn classpath(suite_dir: &Path) -> Result<Classpath> {
  let stdout = mx(suite_dir)
    .args(["classpath", "TRUFFLE_API,RUBY"])
    .status_stdout()
    .context("mx classpath")?;

  parse_classpath(&stdout)
}

/// The classpath is the last line `mx classpath` prints, Truffle API first.
fn parse_classpath(stdout: &str) -> Result<Classpath> {
  let line = stdout
    .lines()
    .rev()
    .map(str::trim)
    .find(|line| !line.is_empty())
    .context("empty classpath")?;

  let mut entries = line.split(':').map(String::from);
  let truffle_api = PathBuf::from(entries.next().context("empty classpath")?);

  if truffle_api.file_name().map_or(true, |name| name != TRUFFLE_API_JAR) {
    anyhow::bail!("expected {TRUFFLE_API_JAR} first on the classpath, got {truffle_api:?}");
  }

  Ok(Classpath {
    truffle_api,
    entries: entries.collect(),
  })
}

/// Runs the TCK unit tests with `JRUBY_HOME` pointing at `jruby_home`.
pub fn unittest(suite_dir: &Path, jruby_home: &Path) -> Result<()> {
  mx(suite_dir)
    .args(["unittest", "--verbose", "--suite", "jruby"])
    .env("JRUBY_HOME", jruby_home)
    .check_success()
    .context("mx unittest")
}

pub fn active_branch(suite_dir: &Path) -> Result<String> {
  let stdout = Command::new("git")
    .current_dir(suite_dir)
    .args(["rev-parse", "--abbrev-ref", "HEAD"])
    .status_stdout()
    .context("git rev-parse")?;

  Ok(stdout.trim().to_string())
}

/// Deploys binaries when the checkout is on [`DEPLOY_BRANCH`], otherwise does
/// nothing.
pub fn deploy_binary_if_truffle_head(suite_dir: &Path, args: &[String]) -> Result<()> {
  let branch = active_branch(suite_dir)?;

  if branch != DEPLOY_BRANCH {
    tracing::info!("The active branch is {branch:?}. Binaries are deployed only if the active branch is {DEPLOY_BRANCH:?}.");
    return Ok(());
  }

  mx(suite_dir)
    .arg("deploy-binary")
    .args(args)
    .check_success()
    .context("mx deploy-binary")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classpath_from_last_line() {
    let classpath = parse_classpath("Updating primary suite\n/m/truffle-api.jar:/m/ruby.jar:/m/jnr.jar\n").unwrap();

    assert_eq!(classpath.truffle_api, PathBuf::from("/m/truffle-api.jar"));
    assert_eq!(classpath.entries, vec!["/m/ruby.jar", "/m/jnr.jar"]);
  }

  #[test]
  fn classpath_must_start_with_truffle_api() {
    assert!(parse_classpath("/m/ruby.jar:/m/truffle-api.jar\n").is_err());
    assert!(parse_classpath("\n").is_err());
  }
}
