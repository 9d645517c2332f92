mod bench;
mod config;
mod ext;
mod extract;
mod format;
mod home;
mod jt;
mod mx;
mod record;
mod ruby;
mod server;
mod staleness;
mod suite;
mod warmup;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{
  bench::Bench,
  config::Config,
  jt::Jt,
  staleness::Staleness,
  suite::Suite,
};

#[derive(Parser)]
#[command(about = "Runs and benchmarks JRuby through its development tooling")]
struct Args {
  #[command(flatten)]
  config: Config,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Runs Ruby, translating `-J` and `-X` options for the JVM.
  Ruby {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },
  /// Runs the TCK unit tests.
  Rubytck,
  /// Deploys binaries if the active branch is the deploy branch.
  DeployBinaryIfTruffleHead {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },
  /// Runs a benchmark suite and prints the results as JSON.
  Bench {
    /// Which suite to run.
    suite: String,
    /// Benchmarks to run, the suite's defaults if none.
    benchmarks: Vec<String>,
    /// Extra arguments passed to each benchmark.
    #[arg(last = true)]
    suite_args: Vec<String>,
  },
  /// Lists the suites, or the benchmarks of one suite.
  List { suite: Option<String> },
  /// Checks whether the core jar is older than its sources. Exits with 1 if
  /// it is.
  NeedsBuild {
    /// Built jar, relative to the suite directory.
    #[arg(long)]
    jar: PathBuf,
    /// Files and directories the jar is built from.
    #[arg(short, long)]
    watch: Vec<PathBuf>,
  },
}

fn suite(name: &str) -> Result<Suite> {
  Suite::from_name(name).with_context(|| {
    let names = Suite::ALL.map(Suite::name).join(", ");
    format!("unknown suite {name:?}, expected one of {names}")
  })
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
    .with_writer(std::io::stderr)
    .init();
}

fn main() -> Result<()> {
  let Args { config, command } = Args::parse();
  let config = config.with_environment();
  init_tracing(config.verbose);

  if !config.suite_dir.exists() {
    anyhow::bail!("{:?} does not exist", config.suite_dir);
  }

  match command {
    Command::Ruby { args } => ruby::run(&config, &args).context("ruby")?,
    Command::Rubytck => {
      let jruby_home = home::jruby_home(&config).context("jruby home")?;
      mx::unittest(&config.suite_dir, &jruby_home).context("rubytck")?;
    }
    Command::DeployBinaryIfTruffleHead { args } => {
      mx::deploy_binary_if_truffle_head(&config.suite_dir, &args).context("deploy")?;
    }
    Command::Bench {
      suite: name,
      benchmarks,
      suite_args,
    } => {
      let suite = suite(&name)?;

      let mut bench = Bench::new(Jt::new(&config.suite_dir), config.no_graal, config.vm.clone());
      bench.bench(suite, &benchmarks, &suite_args).context("bench")?;

      println!("{}", serde_json::to_string_pretty(&bench.records).context("serialize")?);
    }
    Command::List { suite: None } => {
      for suite in Suite::ALL {
        println!("{}", suite.name());
      }
    }
    Command::List { suite: Some(name) } => {
      let suite = suite(&name)?;
      let bench = Bench::new(Jt::new(&config.suite_dir), config.no_graal, config.vm.clone());

      for benchmark in bench.benchmarks(suite).context("benchmarks")? {
        println!("{benchmark}");
      }
    }
    Command::NeedsBuild { jar, watch } => {
      match staleness::needs_build(&config.suite_dir, &jar, &watch).context("needs build")? {
        Staleness::UpToDate => println!("all files are up to date"),
        Staleness::Stale(reason) => {
          println!("{reason}");
          std::process::exit(1);
        }
      }
    }
  }

  Ok(())
}
