use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::{
  config::VmContext,
  ext::CommandExt as _,
  format,
  jt::Jt,
  record::ResultRecord,
  suite::{Kind, MetricsKind, Suite, SERVER_BENCHMARK_TIME},
};

/// How long a server benchmark gets to start before it is measured.
const SERVER_STARTUP: Duration = Duration::from_secs(10);

const SERVER_HARNESS: &str = "all-ruby-benchmarks/servers/harness.rb";

pub struct Bench {
  jt: Jt,
  /// Passes `--no-graal` to benchmarks and starts servers without Graal.
  no_graal: bool,
  /// Labels attached to every record.
  context: VmContext,
  /// Records collected so far, in run order.
  pub records: Vec<ResultRecord>,
}

impl Bench {
  pub fn new(jt: Jt, no_graal: bool, context: VmContext) -> Self {
    Self {
      jt,
      no_graal,
      context,
      records: Vec::new(),
    }
  }

  /// Runs `benchmarks` of `suite`, or its default benchmarks if none are named.
  pub fn bench(&mut self, suite: Suite, benchmarks: &[String], suite_args: &[String]) -> Result<()> {
    let benchmarks = if benchmarks.is_empty() {
      self.default_benchmarks(suite).context("default benchmarks")?
    } else {
      benchmarks.to_vec()
    };

    tracing::info!("benchmarking suite {:?}", suite.name());
    for benchmark in &benchmarks {
      tracing::info!("  running {benchmark:?}");

      let records = self
        .run_benchmark(suite, benchmark, suite_args)
        .with_context(|| format!("{} {benchmark}", suite.name()))?;

      self.collect(records);
    }

    Ok(())
  }

  /// Labels `records` with the VM context and appends them to the results.
  fn collect(&mut self, records: Vec<ResultRecord>) {
    let context = &self.context;
    self.records.extend(records.into_iter().map(|record| record.enrich(context)));
  }

  pub fn benchmarks(&self, suite: Suite) -> Result<Vec<String>> {
    match suite.known_benchmarks() {
      Some(benchmarks) => Ok(benchmarks.iter().map(|b| b.to_string()).collect()),
      None => self.micro_benchmarks().context("micro benchmarks"),
    }
  }

  fn default_benchmarks(&self, suite: Suite) -> Result<Vec<String>> {
    match suite.default_benchmarks() {
      Some(benchmarks) => Ok(benchmarks.iter().map(|b| b.to_string()).collect()),
      None => self.benchmarks(suite),
    }
  }

  fn run_benchmark(&self, suite: Suite, benchmark: &str, suite_args: &[String]) -> Result<Vec<ResultRecord>> {
    match suite.kind() {
      Kind::Throughput => {
        let arguments = suite.benchmark_arguments(benchmark, suite_args, self.no_graal);
        let captured = self.jt.capture(&arguments)?;

        if !captured.status.success() {
          tracing::warn!("{benchmark} exited with {}", captured.status);
          captured.forward_to_stderr()?;
        }

        Ok(format::throughput(benchmark, &captured)?)
      }
      Kind::Server => self.run_server(benchmark),
      Kind::Metrics(kind) => {
        let arguments = suite.metrics_arguments(benchmark, suite_args)?;
        let json = self.jt.stdout(&arguments)?;

        match kind {
          MetricsKind::Alloc => format::allocation(benchmark, &json),
          MetricsKind::MinHeap => format::min_heap(benchmark, &json),
          MetricsKind::Time => format::time(benchmark, &json),
        }
      }
    }
  }

  fn run_server(&self, benchmark: &str) -> Result<Vec<ResultRecord>> {
    let mut server = self
      .jt
      .background(&Suite::server_arguments(benchmark, self.no_graal))
      .context("start server")?;

    if !server.settle(SERVER_STARTUP)? {
      tracing::warn!("{benchmark} server exited during startup");
    }

    let captured = self
      .jt
      .ruby()
      .arg(SERVER_HARNESS)
      .arg(SERVER_BENCHMARK_TIME.to_string())
      .capture()
      .context("server harness")?;
    let running = server.is_running()?;

    if !captured.status.success() || !running {
      tracing::warn!("{benchmark} failed, harness {}, server running: {running}", captured.status);
      captured.forward_to_stderr()?;
    }

    format::server(benchmark, &captured, running)
  }

  /// Lists every benchmark in the `micro` directory of the benchmark
  /// repository, as `file:name`.
  fn micro_benchmarks(&self) -> Result<Vec<String>> {
    let root = self
      .jt
      .stdout(&["where", "repos", "all-ruby-benchmarks"].map(String::from))?
      .trim()
      .to_string();

    let mut benchmarks = Vec::new();
    for file in ruby_files(Path::new(&root).join("micro"), Path::new(&root))? {
      let listing = self.jt.stdout(&["benchmark".to_string(), "list".to_string(), file.clone()])?;

      benchmarks.extend(list_benchmarks(&file, &listing));
    }

    Ok(benchmarks)
  }
}

/// `.rb` files under `dir`, in name order, as paths relative to `root`.
fn ruby_files<P: AsRef<Path>>(dir: P, root: &Path) -> Result<Vec<String>> {
  let mut files = Vec::new();

  for entry in WalkDir::new(dir).sort_by_file_name() {
    let entry = entry.context("walk")?;
    if !entry.file_type().is_file() || entry.path().extension().map_or(true, |ext| ext != "rb") {
      continue;
    }

    let relative = entry.path().strip_prefix(root).context("strip prefix")?;
    files.push(relative.to_string_lossy().into_owned());
  }

  Ok(files)
}

/// Turns `jt.rb benchmark list` output into `file:name` entries.
fn list_benchmarks(file: &str, listing: &str) -> Vec<String> {
  listing
    .lines()
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .map(|name| format!("{file}:{name}"))
    .collect()
}
