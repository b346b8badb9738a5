//! Latency sample recording inside a configurable capture window

use crate::error::Result;

use super::{monotonic_ns, report::LatencyReport};

/// One recorded transfer: send and capture timestamps in monotonic nanoseconds
#[derive(Debug, Clone, Copy)]
pub struct TimedSample {
    pub sent_ns: i64,
    pub captured_ns: i64,
}

impl TimedSample {
    /// Elapsed time in microseconds
    pub fn elapsed_us(&self) -> f64 {
        (self.captured_ns - self.sent_ns) as f64 / 1_000.0
    }
}

/// Records latency samples during a capture window
///
/// Storage is preallocated up front so recording never allocates; samples
/// arriving past the cap are counted but not stored.
#[derive(Debug)]
pub struct LatencyRecorder {
    samples: Vec<TimedSample>,
    max_samples: usize,
    window_start_ns: i64,
    window_end_ns: i64,
    overflowed: u64,
}

impl LatencyRecorder {
    /// Recorder with an always-open capture window
    pub fn new(max_samples: usize) -> Self {
        Self::with_window_bounds(max_samples, i64::MIN, i64::MAX)
    }

    /// Recorder whose window opens `start_delay_secs` from now and stays
    /// open for `duration_secs` (0 = unbounded)
    pub fn with_window(
        max_samples: usize,
        start_delay_secs: u64,
        duration_secs: u64,
    ) -> Result<Self> {
        let now = monotonic_ns()?;
        let start = now + start_delay_secs as i64 * 1_000_000_000;
        let end = if duration_secs > 0 {
            start + duration_secs as i64 * 1_000_000_000
        } else {
            i64::MAX
        };
        Ok(Self::with_window_bounds(max_samples, start, end))
    }

    /// Recorder with explicit window bounds in monotonic nanoseconds
    pub fn with_window_bounds(max_samples: usize, start_ns: i64, end_ns: i64) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            max_samples,
            window_start_ns: start_ns,
            window_end_ns: end_ns,
            overflowed: 0,
        }
    }

    /// Record a sample captured right now; returns the elapsed time in
    /// microseconds, or `None` when the capture fell outside the window
    pub fn record(&mut self, sent_ns: i64) -> Result<Option<f64>> {
        let captured_ns = monotonic_ns()?;
        Ok(self.record_at(sent_ns, captured_ns))
    }

    /// Record a sample with an explicit capture timestamp
    pub fn record_at(&mut self, sent_ns: i64, captured_ns: i64) -> Option<f64> {
        if captured_ns <= self.window_start_ns || captured_ns >= self.window_end_ns {
            return None;
        }

        let sample = TimedSample {
            sent_ns,
            captured_ns,
        };
        if self.samples.len() < self.max_samples {
            self.samples.push(sample);
        } else {
            self.overflowed += 1;
        }
        Some(sample.elapsed_us())
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been stored
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples that arrived after the storage cap was reached
    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }

    /// Compute statistics over the stored samples
    ///
    /// `safety_margin` samples are discarded from each end of the capture
    /// (warm-up and shutdown transients). Returns `None` when fewer than two
    /// samples survive the trim.
    pub fn process(&self, safety_margin: usize) -> Option<LatencyReport> {
        let total = self.samples.len();
        if total < 2 {
            return None;
        }

        let start = if total - 1 > safety_margin {
            safety_margin
        } else {
            0
        };
        let stop = if total > safety_margin {
            total - safety_margin
        } else {
            total
        };
        if stop <= start || stop - start < 2 {
            return None;
        }

        LatencyReport::from_samples(&self.samples[start..stop])
    }
}
