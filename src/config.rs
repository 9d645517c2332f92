use std::{env, ffi::OsString, path::PathBuf};

use clap::Args;
use serde::Serialize;

/// Labels describing where a benchmark ran. Every result record carries them
/// so the reporting side can group results by execution context.
#[derive(Args, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct VmContext {
  #[arg(long, env = "HOST_VM", default_value = "host-vm")]
  #[serde(rename = "host-vm")]
  pub host_vm: String,
  #[arg(long, env = "HOST_VM_CONFIG", default_value = "host-vm-config")]
  #[serde(rename = "host-vm-config")]
  pub host_vm_config: String,
  #[arg(long, env = "GUEST_VM", default_value = "guest-vm")]
  #[serde(rename = "guest-vm")]
  pub guest_vm: String,
  #[arg(long, env = "GUEST_VM_CONFIG", default_value = "guest-vm-config")]
  #[serde(rename = "guest-vm-config")]
  pub guest_vm_config: String,
}

impl Default for VmContext {
  fn default() -> Self {
    Self {
      host_vm: "host-vm".into(),
      host_vm_config: "host-vm-config".into(),
      guest_vm: "guest-vm".into(),
      guest_vm_config: "guest-vm-config".into(),
    }
  }
}

#[derive(Args, Clone, Debug)]
pub struct JavaConfig {
  #[arg(long, env = "JAVA_HOME", default_value = "/usr")]
  pub java_home: PathBuf,
  /// Java executable, overriding `$JAVA_HOME/bin/java`.
  #[arg(long, env = "JAVACMD")]
  pub java_cmd: Option<PathBuf>,
}

impl JavaConfig {
  pub fn java(&self) -> PathBuf {
    self
      .java_cmd
      .clone()
      .unwrap_or_else(|| self.java_home.join("bin").join("java"))
  }
}

#[derive(Args, Clone, Debug)]
pub struct Config {
  /// Root of the JRuby checkout.
  #[arg(long, env = "JRUBY_SUITE_DIR", default_value = ".")]
  pub suite_dir: PathBuf,
  /// Runs benchmarks without the Graal compiler. Also on whenever
  /// `MX_NO_GRAAL` is set, whatever its value.
  #[arg(long)]
  pub no_graal: bool,
  #[arg(short, long)]
  pub verbose: bool,
  /// Use this JRuby home instead of extracting the Ruby archive. An ambient
  /// `JRUBY_HOME` is not read; it is overwritten for the child process.
  #[arg(long)]
  pub jruby_home: Option<PathBuf>,
  /// Ruby archive to extract as JRuby home.
  #[arg(long)]
  pub ruby_zip: Option<PathBuf>,
  /// Extra options prepended to `ruby` arguments.
  #[arg(long, env = "JRUBY_OPTS")]
  pub jruby_opts: Option<String>,
  #[command(flatten)]
  pub java: JavaConfig,
  #[command(flatten)]
  pub vm: VmContext,
}

impl Config {
  /// Folds in the variables that act by being present rather than by value.
  pub fn with_environment(self) -> Self {
    self.with_no_graal_var(env::var_os("MX_NO_GRAAL"))
  }

  fn with_no_graal_var(mut self, var: Option<OsString>) -> Self {
    self.no_graal |= var.is_some();
    self
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  #[derive(Parser)]
  struct Cli {
    #[command(flatten)]
    vm: VmContext,
    #[command(flatten)]
    java: JavaConfig,
  }

  #[derive(Parser)]
  struct ConfigCli {
    #[command(flatten)]
    config: Config,
  }

  fn parse_config(args: &[&str]) -> Config {
    ConfigCli::try_parse_from(std::iter::once("test").chain(args.iter().copied()))
      .unwrap()
      .config
  }

  #[test]
  fn context_defaults_match_literal_fallbacks() {
    let cli = Cli::try_parse_from(["test", "--host-vm", "server", "--java-cmd", "/opt/java"]).unwrap();

    assert_eq!(cli.vm.host_vm, "server");
    assert_eq!(cli.vm.host_vm_config, VmContext::default().host_vm_config);
    assert_eq!(cli.vm.guest_vm, "guest-vm");
    assert_eq!(cli.java.java(), PathBuf::from("/opt/java"));
  }

  #[test]
  fn java_defaults_to_java_home() {
    let java = JavaConfig {
      java_home: "/usr/lib/jvm/17".into(),
      java_cmd: None,
    };

    assert_eq!(java.java(), PathBuf::from("/usr/lib/jvm/17/bin/java"));
  }

  #[test]
  fn no_graal_var_counts_when_present() {
    for value in ["", "0", "false", "true"] {
      let config = parse_config(&[]).with_no_graal_var(Some(value.into()));
      assert!(config.no_graal, "MX_NO_GRAAL={value:?}");
    }

    assert!(!parse_config(&[]).with_no_graal_var(None).no_graal);
    assert!(parse_config(&["--no-graal"]).with_no_graal_var(None).no_graal);
  }
}
