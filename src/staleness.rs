use std::{fs, path::Path};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::ext::PathExt as _;

/// Native libraries the Maven build leaves behind.
const JNI_LIBS: &str = "lib/jni";
/// Bundler installed into the shared gem home after the Maven build.
const BUNDLER: &str = "lib/ruby/gems/shared/gems/bundler-1.10.6";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
  UpToDate,
  Stale(String),
}

/// Decides whether the core jar must be rebuilt. `jar` and `watched` are
/// relative to `suite_dir`. Reports the first reason found.
pub fn needs_build<P: AsRef<Path>>(suite_dir: &Path, jar: &Path, watched: &[P]) -> Result<Staleness> {
  let jar = suite_dir.join(jar);
  if !jar.exists() {
    return Ok(Staleness::Stale("no jar yet".into()));
  }

  for required in [JNI_LIBS, BUNDLER] {
    let required = suite_dir.join(required);
    if is_missing_or_empty(&required)? {
      return Ok(Staleness::Stale(required.display().to_string()));
    }
  }

  for watched in watched {
    let watched = suite_dir.join(watched);
    if !watched.exists() {
      return Ok(Staleness::Stale(format!("{} does not exist", watched.display())));
    }

    for entry in WalkDir::new(&watched) {
      let entry = entry.context("walk")?;
      if entry.file_type().is_file() && entry.path().is_newer_than(&jar)? {
        return Ok(Staleness::Stale(format!("{} is newer than the jar", entry.path().display())));
      }
    }
  }

  Ok(Staleness::UpToDate)
}

fn is_missing_or_empty(dir: &Path) -> Result<bool> {
  if !dir.exists() {
    return Ok(true);
  }

  Ok(fs::read_dir(dir).with_context(|| format!("read_dir {dir:?}"))?.next().is_none())
}
