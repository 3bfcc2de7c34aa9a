//! Per-frame diagnostic statistics.
//!
//! Frames are u16, so statistics are computed from a full 65536-bin histogram.
//! Counting is exact and the result does not depend on how rayon splits the
//! work.

use rayon::prelude::*;

const BINS: usize = 1 << 16;
/// Below this many samples the histogram is built on the calling thread.
const PARALLEL_THRESHOLD: usize = 1 << 18;
const CHUNK: usize = 1 << 16;

/// Population statistics of one frame (variance with ddof = 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
}

fn count_into(mut hist: Vec<u64>, samples: &[u16]) -> Vec<u64> {
    for &v in samples {
        hist[v as usize] += 1;
    }
    hist
}

/// Histogram with one bin per u16 value.
pub fn histogram(samples: &[u16]) -> Vec<u64> {
    if samples.len() < PARALLEL_THRESHOLD {
        return count_into(vec![0u64; BINS], samples);
    }
    samples
        .par_chunks(CHUNK)
        .fold(|| vec![0u64; BINS], count_into)
        .reduce(
            || vec![0u64; BINS],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
                a
            },
        )
}

/// Sample value at 0-based `rank` in sorted order.
fn value_at_rank(hist: &[u64], rank: u64) -> f64 {
    let mut seen = 0u64;
    for (value, &count) in hist.iter().enumerate() {
        seen += count;
        if seen > rank {
            return value as f64;
        }
    }
    (hist.len() - 1) as f64
}

impl FrameStats {
    /// `None` for an empty frame.
    pub fn from_samples(samples: &[u16]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        Some(Self::from_histogram(&histogram(samples)))
    }

    pub fn from_histogram(hist: &[u64]) -> Self {
        let n: u64 = hist.iter().sum();
        let sum: u64 = hist.iter().enumerate().map(|(v, &c)| v as u64 * c).sum();
        let mean = sum as f64 / n as f64;
        let variance = hist
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(v, &c)| c as f64 * (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n as f64;

        // Even counts average the two middle samples.
        let median = (value_at_rank(hist, (n - 1) / 2) + value_at_rank(hist, n / 2)) / 2.0;

        Self {
            mean,
            median,
            std_dev: variance.sqrt(),
            variance,
        }
    }

    /// Same statistics over floating-point samples, e.g. an averaged frame.
    pub fn from_f64(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.par_iter().sum::<f64>() / n;
        let variance = samples.par_iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = samples.to_vec();
        let hi = sorted.len() / 2;
        let cmp = |a: &f64, b: &f64| a.total_cmp(b);
        let (below, upper, _) = sorted.select_nth_unstable_by(hi, cmp);
        let upper = *upper;
        let median = if samples.len() % 2 == 0 {
            let lower = below.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (lower + upper) / 2.0
        } else {
            upper
        };

        Some(Self {
            mean,
            median,
            std_dev: variance.sqrt(),
            variance,
        })
    }
}
