use crate::extract::Samples;

/// Fraction of a run, by sample count, treated as warm-up. A fixed heuristic
/// rather than a detected steady state.
pub const WARMUP_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedSample {
  pub index: usize,
  pub elapsed: f64,
  pub value: f64,
  pub warmed_up: bool,
}

/// Whether sample `n` of `total` is past the warm-up period. A lone sample
/// counts as warmed up.
pub fn is_warmed_up(n: usize, total: usize) -> bool {
  total == 1 || n as f64 / total as f64 >= WARMUP_FRACTION
}

/// Mean of the warmed-up samples, `None` if there are none.
pub fn warmed_up_mean(values: &[f64]) -> Option<f64> {
  let warmed_up = values
    .iter()
    .enumerate()
    .filter(|&(n, _)| is_warmed_up(n, values.len()))
    .map(|(_, &value)| value)
    .collect::<Vec<_>>();

  if warmed_up.is_empty() {
    return None;
  }

  Some(warmed_up.iter().sum::<f64>() / warmed_up.len() as f64)
}

pub fn classify(samples: &Samples) -> Vec<ClassifiedSample> {
  let total = samples.len();

  samples
    .pairs()
    .enumerate()
    .map(|(index, (elapsed, value))| ClassifiedSample {
      index,
      elapsed,
      value,
      warmed_up: is_warmed_up(index, total),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn second_half_is_warmed_up() {
    let flags = (0..4).map(|n| is_warmed_up(n, 4)).collect::<Vec<_>>();

    assert_eq!(flags, vec![false, false, true, true]);
  }

  #[test]
  fn odd_total_rounds_towards_warm_up() {
    let flags = (0..5).map(|n| is_warmed_up(n, 5)).collect::<Vec<_>>();

    assert_eq!(flags, vec![false, false, false, true, true]);
  }

  #[test]
  fn single_sample_is_warmed_up() {
    assert!(is_warmed_up(0, 1));
    assert_eq!(warmed_up_mean(&[42.0]), Some(42.0));
  }

  #[test]
  fn mean_ignores_warm_up() {
    assert_eq!(warmed_up_mean(&[1.0, 1.0, 10.0, 20.0]), Some(15.0));
    assert_eq!(warmed_up_mean(&[]), None);
  }

  #[test]
  fn classify_tags_indices() {
    let samples = Samples {
      elapsed: vec![1.0, 2.0],
      values: vec![5.0, 6.0],
    };

    let classified = classify(&samples);

    assert_eq!(classified.len(), 2);
    assert_eq!(classified[1].index, 1);
    assert_eq!(classified[1].elapsed, 2.0);
    assert!(!classified[0].warmed_up);
    assert!(classified[1].warmed_up);
  }
}
