use std::{
  fs,
  path::{Path, PathBuf},
  process::Command,
};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::{
  config::Config,
  ext::{CommandExt as _, PathExt as _},
};

const RUBY_ZIP: &str = "mxbuild/dists/ruby-zip.tar";
const EXTRACTED: &str = "mxbuild/ruby-zip-extracted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
  Tar,
  Zip,
}

impl ArchiveFormat {
  pub fn from_path(archive: &Path) -> Result<Self> {
    let name = archive.to_string_lossy();

    if name.ends_with("tar") {
      Ok(ArchiveFormat::Tar)
    } else if name.ends_with("jar") || name.ends_with("zip") {
      Ok(ArchiveFormat::Zip)
    } else {
      anyhow::bail!("unsupported compressed file {archive:?}")
    }
  }

  fn command(self, archive: &Path, target: &Path) -> Command {
    match self {
      ArchiveFormat::Tar => {
        let mut tar = Command::new("tar");
        tar.arg("-xf").arg(archive).arg("-C").arg(target);
        tar
      }
      ArchiveFormat::Zip => {
        let mut unzip = Command::new("unzip");
        unzip.arg("-q").arg(archive).arg("-d").arg(target);
        unzip
      }
    }
  }
}

/// Returns the JRuby home to run with: the configured one, or the Ruby archive
/// extracted under `mxbuild`.
pub fn jruby_home(config: &Config) -> Result<PathBuf> {
  if let Some(home) = &config.jruby_home {
    return Ok(home.clone());
  }

  let archive = config
    .ruby_zip
    .clone()
    .unwrap_or_else(|| config.suite_dir.join(RUBY_ZIP));
  let target = config.suite_dir.join(EXTRACTED);

  ensure_extracted(&archive, &target).context("extract ruby archive")?;

  Ok(target)
}

/// Extracts `archive` into `target` unless `target` is already newer.
pub fn ensure_extracted(archive: &Path, target: &Path) -> Result<()> {
  if !archive.exists() {
    anyhow::bail!("{archive:?} does not exist");
  }

  if target.exists() && !archive.is_newer_than(target)? {
    return Ok(());
  }

  if target.exists() {
    fs::remove_dir_all(target).with_context(|| format!("remove {target:?}"))?;
  }

  extract(archive, target)
}

/// Extracts into a temporary sibling of `target`, then moves it into place, so
/// an interrupted extraction never looks up to date.
pub fn extract(archive: &Path, target: &Path) -> Result<()> {
  let format = ArchiveFormat::from_path(archive)?;
  let parent = target.parent().context("target parent")?;
  fs::create_dir_all(parent).context("create_dir_all")?;

  tracing::info!("extracting {archive:?} to {target:?}");

  let staging = TempDir::with_prefix_in("ruby-zip-", parent).context("tempdir")?;
  format
    .command(archive, staging.path())
    .check_success()
    .with_context(|| format!("extract {archive:?}"))?;

  fs::rename(staging.keep(), target).context("rename")?;

  Ok(())
}
