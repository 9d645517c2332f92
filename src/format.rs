use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Number;

use crate::{
  ext::Captured,
  extract::{self, DataIntegrityError, Samples, OPTIMISED_AWAY},
  record::{Metric, MetricValue, ResultRecord},
  warmup,
};

/// Reported in place of a measurement when the benchmark was optimised away.
/// Higher than anything `--simple` can actually report.
pub const OPTIMISED_AWAY_THROUGHPUT: i64 = 2147483647;

/// Places the optimised-away point just beyond the last real one.
pub const OPTIMISED_AWAY_ELAPSED_OFFSET: f64 = 2.0;

const FAILED: &str = "failed";

/// The single record reported for a run that did not produce usable output.
pub fn failed(benchmark: &str) -> ResultRecord {
  ResultRecord {
    warmed_up: Some(true),
    error: Some(FAILED),
    ..ResultRecord::new(benchmark, Metric::Throughput, MetricValue::Int(0))
  }
}

/// Formats the output of a `jt.rb benchmark --simple --elapsed` run.
pub fn throughput(benchmark: &str, captured: &Captured) -> Result<Vec<ResultRecord>, DataIntegrityError> {
  if !captured.status.success() {
    return Ok(vec![failed(benchmark)]);
  }

  let lines = extract::body_lines(&captured.stdout);
  let optimised_away = lines.last() == Some(&OPTIMISED_AWAY);
  let samples = extract::extract(lines)?;

  if optimised_away {
    optimised_away_records(benchmark, &samples)
  } else {
    steady_records(benchmark, &samples)
  }
}

fn steady_records(benchmark: &str, samples: &Samples) -> Result<Vec<ResultRecord>, DataIntegrityError> {
  let mean = warmup::warmed_up_mean(&samples.values).ok_or(DataIntegrityError::NoSamples)?;
  let total = samples.len();

  Ok(
    warmup::classify(samples)
      .into_iter()
      .map(|sample| ResultRecord {
        iteration: Some(sample.index),
        warmed_up: Some(sample.warmed_up),
        elapsed: Some(sample.elapsed),
        human: Some(format!("{}/{total} {mean:.6} op/s", sample.index)),
        ..ResultRecord::new(benchmark, Metric::Throughput, MetricValue::Float(sample.value))
      })
      .collect(),
  )
}

fn optimised_away_records(benchmark: &str, samples: &Samples) -> Result<Vec<ResultRecord>, DataIntegrityError> {
  let last_elapsed = *samples.elapsed.last().ok_or(DataIntegrityError::NoSamples)?;

  let mut records = samples
    .pairs()
    .enumerate()
    .map(|(n, (elapsed, value))| ResultRecord {
      iteration: Some(n),
      warmed_up: Some(false),
      elapsed: Some(elapsed),
      human: Some(OPTIMISED_AWAY.to_string()),
      ..ResultRecord::new(benchmark, Metric::Throughput, MetricValue::Float(value))
    })
    .collect::<Vec<_>>();

  records.push(ResultRecord {
    iteration: Some(samples.len()),
    warmed_up: Some(true),
    elapsed: Some(last_elapsed + OPTIMISED_AWAY_ELAPSED_OFFSET),
    human: Some(OPTIMISED_AWAY.to_string()),
    error: Some(OPTIMISED_AWAY),
    ..ResultRecord::new(
      benchmark,
      Metric::Throughput,
      MetricValue::Int(OPTIMISED_AWAY_THROUGHPUT),
    )
  });

  Ok(records)
}

/// Samples and a summary printed by `jt.rb metrics alloc|time --json`.
#[derive(Deserialize, Debug)]
struct Series {
  samples: Vec<Number>,
  human: String,
}

#[derive(Deserialize, Debug)]
struct MinHeap {
  min: Number,
  human: String,
}

/// One record per allocation sample. Allocation counts are stable from the
/// first iteration, so there is no warm-up split.
pub fn allocation(benchmark: &str, json: &str) -> Result<Vec<ResultRecord>> {
  let series: Series = serde_json::from_str(json).context("parse allocation json")?;
  let total = series.samples.len();

  Ok(
    series
      .samples
      .iter()
      .enumerate()
      .map(|(n, sample)| ResultRecord {
        iteration: Some(n),
        human: Some(format!("{n}/{total} {}", series.human)),
        ..ResultRecord::new(benchmark, Metric::Allocation, MetricValue::Number(sample.clone()))
      })
      .collect(),
  )
}

pub fn min_heap(benchmark: &str, json: &str) -> Result<Vec<ResultRecord>> {
  let min_heap: MinHeap = serde_json::from_str(json).context("parse minheap json")?;

  Ok(vec![ResultRecord {
    human: Some(min_heap.human),
    ..ResultRecord::new(benchmark, Metric::MinHeap, MetricValue::Number(min_heap.min))
  }])
}

/// One record per (region, sample), regions in name order.
pub fn time(benchmark: &str, json: &str) -> Result<Vec<ResultRecord>> {
  let regions: BTreeMap<String, Series> = serde_json::from_str(json).context("parse time json")?;

  let mut records = Vec::new();
  for (region, series) in &regions {
    let total = series.samples.len();

    records.extend(series.samples.iter().enumerate().map(|(n, sample)| ResultRecord {
      iteration: Some(n),
      region: Some(region.clone()),
      human: Some(format!("{n}/{total} {}", series.human)),
      ..ResultRecord::new(benchmark, Metric::Time, MetricValue::Number(sample.clone()))
    }));
  }

  Ok(records)
}

/// Formats the output of the server harness. The server must still be running
/// when the harness finishes, otherwise the measurement is discarded.
pub fn server(benchmark: &str, captured: &Captured, server_running: bool) -> Result<Vec<ResultRecord>> {
  if !captured.status.success() || !server_running {
    return Ok(vec![ResultRecord {
      error: Some(FAILED),
      ..ResultRecord::new(benchmark, Metric::Throughput, MetricValue::Int(0))
    }]);
  }

  let lines = captured.stdout.split('\n').collect::<Vec<_>>();
  let samples = lines[..lines.len() - 1]
    .iter()
    .map(|line| line.trim().parse::<f64>().with_context(|| format!("parse sample {line:?}")))
    .collect::<Result<Vec<_>>>()?;

  if samples.is_empty() {
    return Err(DataIntegrityError::NoSamples.into());
  }

  let used = &samples[server_window_start(samples.len())..];
  let ips = used.iter().sum::<f64>() / used.len() as f64;

  Ok(vec![ResultRecord {
    human: Some(format!("{used:?}")),
    ..ResultRecord::new(benchmark, Metric::Throughput, MetricValue::Float(ips))
  }])
}

/// First sample of the averaged window: the last half, plus one.
fn server_window_start(len: usize) -> usize {
  len - len / 2 - 1
}
