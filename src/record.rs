use serde::{Serialize, Serializer};

use crate::config::VmContext;

/// Which direction of a metric counts as an improvement.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Better {
  Higher,
  Lower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
  Throughput,
  Time,
  Allocation,
  MinHeap,
}

impl Metric {
  pub fn name(self) -> &'static str {
    match self {
      Metric::Throughput => "throughput",
      Metric::Time => "time",
      Metric::Allocation | Metric::MinHeap => "memory",
    }
  }

  pub fn unit(self) -> &'static str {
    match self {
      Metric::Throughput => "op/s",
      Metric::Time => "s",
      Metric::Allocation => "B",
      Metric::MinHeap => "MiB",
    }
  }

  pub fn better(self) -> Better {
    match self {
      Metric::Throughput => Better::Higher,
      Metric::Time | Metric::Allocation | Metric::MinHeap => Better::Lower,
    }
  }
}

/// Measured values are floats, synthesized placeholders are integers.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
  Int(i64),
  Float(f64),
  /// Passed through from `jt.rb metrics` JSON as printed, integer or not.
  Number(serde_json::Number),
}

/// One entry in the output consumed by the reporting pipeline. Serializes to a
/// flat object with dotted keys, omitting the fields that do not apply.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ResultRecord {
  pub benchmark: String,
  #[serde(rename = "metric.name")]
  pub name: &'static str,
  #[serde(rename = "metric.value")]
  pub value: MetricValue,
  #[serde(rename = "metric.unit")]
  pub unit: &'static str,
  #[serde(rename = "metric.better")]
  pub better: Better,
  #[serde(rename = "metric.iteration", skip_serializing_if = "Option::is_none")]
  pub iteration: Option<usize>,
  #[serde(
    rename = "extra.metric.warmedup",
    skip_serializing_if = "Option::is_none",
    serialize_with = "bool_as_str"
  )]
  pub warmed_up: Option<bool>,
  #[serde(rename = "extra.metric.elapsed-num", skip_serializing_if = "Option::is_none")]
  pub elapsed: Option<f64>,
  #[serde(rename = "extra.metric.human", skip_serializing_if = "Option::is_none")]
  pub human: Option<String>,
  #[serde(rename = "extra.metric.region", skip_serializing_if = "Option::is_none")]
  pub region: Option<String>,
  #[serde(rename = "extra.error", skip_serializing_if = "Option::is_none")]
  pub error: Option<&'static str>,
  #[serde(flatten)]
  pub context: Option<VmContext>,
}

impl ResultRecord {
  pub fn new(benchmark: &str, metric: Metric, value: MetricValue) -> Self {
    Self {
      benchmark: benchmark.to_string(),
      name: metric.name(),
      value,
      unit: metric.unit(),
      better: metric.better(),
      iteration: None,
      warmed_up: None,
      elapsed: None,
      human: None,
      region: None,
      error: None,
      context: None,
    }
  }

  /// Attaches the execution context labels.
  pub fn enrich(self, context: &VmContext) -> Self {
    Self {
      context: Some(context.clone()),
      ..self
    }
  }
}

fn bool_as_str<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
  match value {
    Some(true) => serializer.serialize_str("true"),
    Some(false) => serializer.serialize_str("false"),
    None => serializer.serialize_none(),
  }
}
