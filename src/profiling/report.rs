//! Computed latency statistics and their report format

use std::collections::BTreeMap;
use std::fmt;

use super::recorder::TimedSample;

/// Latency statistics over one capture, all values in microseconds
#[derive(Debug, Clone)]
pub struct LatencyReport {
    /// Number of samples the statistics were computed over
    pub samples: usize,
    pub min_us: f64,
    pub max_us: f64,
    pub mean_us: f64,
    pub median_us: f64,
    /// Sample variance (n-1 denominator)
    pub variance_us: f64,
    pub deviation_us: f64,
    /// Sample count per rounded-microsecond bucket
    pub histogram: BTreeMap<i64, usize>,
}

impl LatencyReport {
    /// Compute a report over a trimmed sample slice
    ///
    /// Returns `None` for fewer than two samples (the variance denominator
    /// needs n-1).
    pub(crate) fn from_samples(samples: &[TimedSample]) -> Option<Self> {
        if samples.len() < 2 {
            return None;
        }

        let mut latencies: Vec<f64> = Vec::with_capacity(samples.len());
        let mut histogram = BTreeMap::new();
        let mut min_us = f64::MAX;
        let mut max_us = f64::MIN;

        for sample in samples {
            let elapsed = sample.elapsed_us();
            *histogram.entry(elapsed.round() as i64).or_insert(0) += 1;
            min_us = min_us.min(elapsed);
            max_us = max_us.max(elapsed);
            latencies.push(elapsed);
        }

        let n = latencies.len();
        let mean_us = latencies.iter().sum::<f64>() / n as f64;
        let variance_us = latencies
            .iter()
            .map(|v| (v - mean_us) * (v - mean_us) / (n - 1) as f64)
            .sum::<f64>();
        let deviation_us = variance_us.sqrt();

        latencies.sort_by(f64::total_cmp);
        let median_us = if n % 2 == 0 {
            (latencies[n / 2 - 1] + latencies[n / 2]) / 2.0
        } else {
            latencies[n / 2]
        };

        Some(Self {
            samples: n,
            min_us,
            max_us,
            mean_us,
            median_us,
            variance_us,
            deviation_us,
            histogram,
        })
    }
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "samples              : {:9}", self.samples)?;
        writeln!(f, "min latency          : {:9.3} us", self.min_us)?;
        writeln!(f, "max latency          : {:9.3} us", self.max_us)?;
        writeln!(f, "average of latency   : {:9.3} us", self.mean_us)?;
        writeln!(f, "median of latency    : {:9.3} us", self.median_us)?;
        writeln!(f, "variance of latency  : {:9.3} us", self.variance_us)?;
        writeln!(f, "deviation of latency : {:9.3} us", self.deviation_us)?;
        writeln!(f, "Histogram")?;
        for (bucket_us, count) in &self.histogram {
            writeln!(f, "{} : {}", bucket_us, count)?;
        }
        Ok(())
    }
}
