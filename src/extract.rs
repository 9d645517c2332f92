use thiserror::Error;

/// What the benchmark driver prints as its last line when the measured code
/// was eliminated by the compiler.
pub const OPTIMISED_AWAY: &str = "optimised away";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataIntegrityError {
  #[error("odd number of values ({0}), expected elapsed/sample pairs")]
  OddValueCount(usize),
  #[error("benchmark output contains no samples")]
  NoSamples,
}

/// Elapsed markers and measured values of one run, paired by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Samples {
  pub elapsed: Vec<f64>,
  pub values: Vec<f64>,
}

impl Samples {
  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
    self.elapsed.iter().copied().zip(self.values.iter().copied())
  }
}

/// Returns the lines of a run's output without the harness banner (first line)
/// and footer (last line).
pub fn body_lines(output: &str) -> Vec<&str> {
  let lines = output.split('\n').collect::<Vec<_>>();

  match lines.len() {
    0..=2 => Vec::new(),
    len => lines[1..len - 1].to_vec(),
  }
}

/// Parses every line as a number, dropping the ones that are not.
pub fn filter_lines<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> Result<Vec<f64>, DataIntegrityError> {
  let mut data = Vec::new();

  for line in lines {
    match line.trim().parse::<f64>() {
      Ok(value) => data.push(value),
      Err(_) => tracing::info!("{line}"),
    }
  }

  if data.len() % 2 != 0 {
    return Err(DataIntegrityError::OddValueCount(data.len()));
  }

  Ok(data)
}

/// Splits values into elapsed markers (even indices) and samples (odd indices).
pub fn split_pairs(data: &[f64]) -> Samples {
  let (elapsed, values): (Vec<_>, Vec<_>) = data.chunks_exact(2).map(|pair| (pair[0], pair[1])).unzip();

  Samples { elapsed, values }
}

pub fn extract<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> Result<Samples, DataIntegrityError> {
  Ok(split_pairs(&filter_lines(lines)?))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn drops_banner_and_footer() {
    assert_eq!(body_lines("banner\n1\n2\n"), vec!["1", "2"]);
    assert_eq!(body_lines("banner\n"), Vec::<&str>::new());
    assert_eq!(body_lines(""), Vec::<&str>::new());
  }

  #[test]
  fn pairs_preserve_order() {
    let lines = ["0.5", "100.0", "warming up", "1.0", "110.0", "1.5", "120.5"];
    let samples = extract(lines).unwrap();

    assert_eq!(samples.elapsed, vec![0.5, 1.0, 1.5]);
    assert_eq!(samples.values, vec![100.0, 110.0, 120.5]);
    assert_eq!(samples.pairs().last(), Some((1.5, 120.5)));
  }

  #[test]
  fn odd_count_is_fatal() {
    assert_eq!(
      extract(["1.0", "2.0", "3.0"]).unwrap_err(),
      DataIntegrityError::OddValueCount(3)
    );
  }

  #[test]
  fn noise_does_not_count_towards_parity() {
    let data = filter_lines(["1", "", "ruby 2.3.1", " 2 ", OPTIMISED_AWAY]).unwrap();

    assert_eq!(data, vec![1.0, 2.0]);
  }
}
