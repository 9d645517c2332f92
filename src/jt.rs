use std::{
  path::{Path, PathBuf},
  process::Command,
};

use anyhow::{Context, Result};

use crate::{
  ext::{Captured, CommandExt as _},
  server::BackgroundServer,
};

/// The JRuby development tool, `tool/jt.rb`, run with the system `ruby`.
pub struct Jt {
  suite_dir: PathBuf,
}

impl Jt {
  pub fn new<P: AsRef<Path>>(suite_dir: P) -> Self {
    Self {
      suite_dir: suite_dir.as_ref().to_path_buf(),
    }
  }

  pub fn command<I, S>(&self, args: I) -> Command
  where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
  {
    let mut jt = self.ruby();
    jt.arg(self.suite_dir.join("tool").join("jt.rb")).args(args);

    jt
  }

  /// Runs `ruby` in the suite directory, for scripts that are not `jt.rb`.
  pub fn ruby(&self) -> Command {
    let mut ruby = Command::new("ruby");
    ruby.current_dir(&self.suite_dir);

    ruby
  }

  /// Runs `jt.rb args...`, capturing stdout whatever the exit status.
  pub fn capture(&self, args: &[String]) -> Result<Captured> {
    tracing::debug!("jt {}", args.join(" "));

    self.command(args).capture().with_context(|| format!("jt {}", args.join(" ")))
  }

  /// Runs `jt.rb args...`, returning an error on non-zero exit.
  pub fn stdout(&self, args: &[String]) -> Result<String> {
    tracing::debug!("jt {}", args.join(" "));

    self
      .command(args)
      .status_stdout()
      .with_context(|| format!("jt {}", args.join(" ")))
  }

  /// Starts `jt.rb args...` as a background server.
  pub fn background(&self, args: &[String]) -> Result<BackgroundServer> {
    BackgroundServer::spawn(&mut self.command(args)).with_context(|| format!("background jt {}", args.join(" ")))
  }
}
