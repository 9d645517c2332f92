use anyhow::Result;

const CLASSIC_BENCHMARKS: &[&str] = &[
  "binary-trees",
  "deltablue",
  "fannkuch",
  "mandelbrot",
  "matrix-multiply",
  "n-body",
  "neural-net",
  "pidigits",
  "red-black",
  "richards",
  "spectral-norm",
];

const CHUNKY_BENCHMARKS: &[&str] = &[
  "chunky-color-r",
  "chunky-color-g",
  "chunky-color-b",
  "chunky-color-a",
  "chunky-color-compose-quick",
  "chunky-canvas-resampling-bilinear",
  "chunky-canvas-resampling-nearest-neighbor",
  "chunky-canvas-resampling-steps-residues",
  "chunky-canvas-resampling-steps",
  "chunky-decode-png-image-pass",
  "chunky-encode-png-image-pass-to-stream",
  "chunky-operations-compose",
  "chunky-operations-replace",
];

const PSD_BENCHMARKS: &[&str] = &[
  "psd-color-cmyk-to-rgb",
  "psd-compose-color-burn",
  "psd-compose-color-dodge",
  "psd-compose-darken",
  "psd-compose-difference",
  "psd-compose-exclusion",
  "psd-compose-hard-light",
  "psd-compose-hard-mix",
  "psd-compose-lighten",
  "psd-compose-linear-burn",
  "psd-compose-linear-dodge",
  "psd-compose-linear-light",
  "psd-compose-multiply",
  "psd-compose-normal",
  "psd-compose-overlay",
  "psd-compose-pin-light",
  "psd-compose-screen",
  "psd-compose-soft-light",
  "psd-compose-vivid-light",
  "psd-imageformat-layerraw-parse-raw",
  "psd-imageformat-rle-decode-rle-channel",
  "psd-imagemode-cmyk-combine-cmyk-channel",
  "psd-imagemode-greyscale-combine-greyscale-channel",
  "psd-imagemode-rgb-combine-rgb-channel",
  "psd-renderer-blender-compose",
  "psd-renderer-clippingmask-apply",
  "psd-renderer-mask-apply",
  "psd-util-clamp",
  "psd-util-pad2",
  "psd-util-pad4",
];

const IMAGE_DEMO_BENCHMARKS: &[&str] = &["image-demo-conv", "image-demo-sobel"];

const ASCIIDOCTOR_BENCHMARKS: &[&str] = &[
  "asciidoctor:file-lines",
  "asciidoctor:string-lines",
  "asciidoctor:read-line",
  "asciidoctor:restore-line",
  "asciidoctor:load-string",
  "asciidoctor:load-file",
  "asciidoctor:quote-match",
  "asciidoctor:quote-sub",
  "asciidoctor:join-lines",
  "asciidoctor:convert",
];

const OPTCARROT_BENCHMARKS: &[&str] = &["optcarrot"];

const SYNTHETIC_BENCHMARKS: &[&str] = &["acid"];

const SAVINA_BENCHMARKS: &[&str] = &["savina-apsp", "savina-radix-sort", "savina-trapezoidal"];

const SERVER_BENCHMARKS: &[&str] = &["tcp-server", "webrick"];

/// Benchmarks of the metrics suites, with the arguments `jt.rb metrics` runs
/// them with.
const METRICS_BENCHMARKS: &[(&str, &[&str])] = &[
  ("hello", &["-e", "puts 'hello'"]),
  ("compile-mandelbrot", &["--graal", "bench/truffle/metrics/mandelbrot.rb"]),
];

const DEFAULT_METRICS_BENCHMARKS: &[&str] = &["hello"];

/// Measurement window of the server harness, in seconds. Shorter windows were
/// unstable.
pub const SERVER_BENCHMARK_TIME: u64 = 60 * 4;

/// How a suite measures and what its output looks like.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
  /// `jt.rb benchmark --simple --elapsed`, elapsed/sample line pairs.
  Throughput,
  /// A background server measured by the server harness.
  Server,
  /// `jt.rb metrics <subcommand> --json`.
  Metrics(MetricsKind),
}

/// What a metrics suite measures, one `jt.rb metrics` subcommand each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricsKind {
  Alloc,
  MinHeap,
  Time,
}

impl MetricsKind {
  pub fn subcommand(self) -> &'static str {
    match self {
      MetricsKind::Alloc => "alloc",
      MetricsKind::MinHeap => "minheap",
      MetricsKind::Time => "time",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suite {
  Classic,
  Chunky,
  Psd,
  ImageDemo,
  Asciidoctor,
  Optcarrot,
  Synthetic,
  Micro,
  Savina,
  Server,
  Allocation,
  MinHeap,
  Time,
}

impl Suite {
  pub const ALL: [Suite; 13] = [
    Suite::Allocation,
    Suite::MinHeap,
    Suite::Time,
    Suite::Classic,
    Suite::Chunky,
    Suite::Psd,
    Suite::ImageDemo,
    Suite::Asciidoctor,
    Suite::Optcarrot,
    Suite::Synthetic,
    Suite::Micro,
    Suite::Savina,
    Suite::Server,
  ];

  pub fn from_name(name: &str) -> Option<Suite> {
    Suite::ALL.into_iter().find(|suite| suite.name() == name)
  }

  pub fn name(self) -> &'static str {
    match self {
      Suite::Classic => "classic",
      Suite::Chunky => "chunky",
      Suite::Psd => "psd",
      Suite::ImageDemo => "image-demo",
      Suite::Asciidoctor => "asciidoctor",
      Suite::Optcarrot => "optcarrot",
      Suite::Synthetic => "synthetic",
      Suite::Micro => "micro",
      Suite::Savina => "savina",
      Suite::Server => "server",
      Suite::Allocation => "allocation",
      Suite::MinHeap => "minheap",
      Suite::Time => "time",
    }
  }

  /// Directory of the benchmark files, relative to the benchmark repository.
  pub fn directory(self) -> &'static str {
    match self {
      Suite::Chunky => "chunky_png",
      Suite::Psd => "psd.rb",
      Suite::Savina => "parallel/savina",
      suite => suite.name(),
    }
  }

  /// Seconds each benchmark is run for.
  pub fn time(self) -> u64 {
    match self {
      Suite::Optcarrot => 200,
      Suite::Micro => 30,
      Suite::Server => SERVER_BENCHMARK_TIME,
      _ => 120,
    }
  }

  pub fn kind(self) -> Kind {
    match self {
      Suite::Server => Kind::Server,
      Suite::Allocation => Kind::Metrics(MetricsKind::Alloc),
      Suite::MinHeap => Kind::Metrics(MetricsKind::MinHeap),
      Suite::Time => Kind::Metrics(MetricsKind::Time),
      _ => Kind::Throughput,
    }
  }

  /// The fixed benchmark list, `None` for suites that discover theirs.
  pub fn known_benchmarks(self) -> Option<Vec<&'static str>> {
    let benchmarks: &[&str] = match self {
      Suite::Classic => CLASSIC_BENCHMARKS,
      Suite::Chunky => CHUNKY_BENCHMARKS,
      Suite::Psd => PSD_BENCHMARKS,
      Suite::ImageDemo => IMAGE_DEMO_BENCHMARKS,
      Suite::Asciidoctor => ASCIIDOCTOR_BENCHMARKS,
      Suite::Optcarrot => OPTCARROT_BENCHMARKS,
      Suite::Synthetic => SYNTHETIC_BENCHMARKS,
      Suite::Savina => SAVINA_BENCHMARKS,
      Suite::Server => SERVER_BENCHMARKS,
      Suite::Allocation | Suite::MinHeap | Suite::Time => {
        return Some(METRICS_BENCHMARKS.iter().map(|(name, _)| *name).collect());
      }
      Suite::Micro => return None,
    };

    Some(benchmarks.to_vec())
  }

  /// What runs when no benchmarks are named.
  pub fn default_benchmarks(self) -> Option<Vec<&'static str>> {
    match self.kind() {
      Kind::Metrics(_) => Some(DEFAULT_METRICS_BENCHMARKS.to_vec()),
      _ => self.known_benchmarks(),
    }
  }

  /// Arguments to `jt.rb` for one throughput benchmark. `benchmark` is either a
  /// file or `file:name`; a file without `.rb` lives in the suite directory.
  pub fn benchmark_arguments(self, benchmark: &str, suite_args: &[String], no_graal: bool) -> Vec<String> {
    let mut arguments = vec!["benchmark".to_string()];
    if no_graal {
      arguments.push("--no-graal".into());
    }
    arguments.extend(["--simple", "--elapsed"].map(String::from));
    arguments.extend(["--time".to_string(), self.time().to_string()]);

    let (file, name) = match benchmark.split_once(':') {
      Some((file, name)) => (file, Some(name)),
      None => (benchmark, None),
    };

    if file.contains(".rb") {
      arguments.push(file.to_string());
    } else {
      arguments.push(format!("{}/{file}.rb", self.directory()));
    }

    arguments.extend(name.map(String::from));
    arguments.extend(suite_args.iter().cloned());

    arguments
  }

  /// Arguments to `jt.rb` for one metrics benchmark.
  pub fn metrics_arguments(self, benchmark: &str, suite_args: &[String]) -> Result<Vec<String>> {
    let Kind::Metrics(kind) = self.kind() else {
      anyhow::bail!("{} is not a metrics suite", self.name());
    };

    let Some((_, benchmark_args)) = METRICS_BENCHMARKS.iter().find(|(name, _)| *name == benchmark) else {
      anyhow::bail!("unknown {} benchmark {benchmark:?}", self.name());
    };

    Ok(
      ["metrics", kind.subcommand(), "--json"]
        .iter()
        .chain(benchmark_args.iter())
        .map(|arg| arg.to_string())
        .chain(suite_args.iter().cloned())
        .collect(),
    )
  }

  /// Arguments to `jt.rb` that start a server benchmark.
  pub fn server_arguments(benchmark: &str, no_graal: bool) -> Vec<String> {
    let mut arguments = vec!["run".to_string(), "--exec".to_string()];
    if !no_graal {
      arguments.extend(["--graal", "-J-G:+TruffleCompilationExceptionsAreFatal"].map(String::from));
    }
    arguments.push(format!("all-ruby-benchmarks/servers/{benchmark}.rb"));

    arguments
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
  }

  #[test]
  fn registry_names_are_unique() {
    for suite in Suite::ALL {
      assert_eq!(Suite::from_name(suite.name()), Some(suite));
    }
    assert_eq!(Suite::from_name("nope"), None);
  }

  #[test]
  fn suite_catalogue() {
    assert_eq!(Suite::Classic.known_benchmarks().unwrap().len(), 11);
    assert_eq!(Suite::Psd.known_benchmarks().unwrap().len(), 30);
    assert_eq!(Suite::Micro.known_benchmarks(), None);
    assert_eq!(Suite::Asciidoctor.directory(), "asciidoctor");
    assert_eq!(Suite::Savina.directory(), "parallel/savina");
    assert_eq!(Suite::Optcarrot.time(), 200);
    assert_eq!(Suite::Micro.time(), 30);
    assert_eq!(Suite::Time.default_benchmarks(), Some(vec!["hello"]));
    assert_eq!(Suite::MinHeap.known_benchmarks(), Some(vec!["hello", "compile-mandelbrot"]));
    assert_eq!(Suite::MinHeap.kind(), Kind::Metrics(MetricsKind::MinHeap));
  }

  #[test]
  fn throughput_arguments_for_plain_benchmark() {
    let arguments = Suite::Chunky.benchmark_arguments("chunky-color-r", &strings(&["--", "-Xfoo"]), false);

    assert_eq!(
      arguments,
      strings(&[
        "benchmark",
        "--simple",
        "--elapsed",
        "--time",
        "120",
        "chunky_png/chunky-color-r.rb",
        "--",
        "-Xfoo",
      ])
    );
  }

  #[test]
  fn throughput_arguments_for_named_benchmark() {
    let arguments = Suite::Micro.benchmark_arguments("micro/core/array.rb:sort", &[], true);

    assert_eq!(
      arguments,
      strings(&[
        "benchmark",
        "--no-graal",
        "--simple",
        "--elapsed",
        "--time",
        "30",
        "micro/core/array.rb",
        "sort",
      ])
    );

    let arguments = Suite::Asciidoctor.benchmark_arguments("asciidoctor:convert", &[], false);
    assert_eq!(&arguments[5..], strings(&["asciidoctor/asciidoctor.rb", "convert"]));
  }

  #[test]
  fn metrics_arguments() {
    let arguments = Suite::Allocation.metrics_arguments("hello", &strings(&["-v"])).unwrap();

    assert_eq!(
      arguments,
      strings(&["metrics", "alloc", "--json", "-e", "puts 'hello'", "-v"])
    );
    assert_eq!(
      Suite::MinHeap.metrics_arguments("compile-mandelbrot", &[]).unwrap()[..2],
      strings(&["metrics", "minheap"])
    );
    assert!(Suite::Allocation.metrics_arguments("nope", &[]).is_err());
    assert!(Suite::Classic.metrics_arguments("hello", &[]).is_err());
  }

  #[test]
  fn server_arguments() {
    assert_eq!(
      Suite::server_arguments("webrick", false),
      strings(&[
        "run",
        "--exec",
        "--graal",
        "-J-G:+TruffleCompilationExceptionsAreFatal",
        "all-ruby-benchmarks/servers/webrick.rb",
      ])
    );
    assert_eq!(
      Suite::server_arguments("tcp-server", true),
      strings(&["run", "--exec", "all-ruby-benchmarks/servers/tcp-server.rb"])
    );
  }
}
