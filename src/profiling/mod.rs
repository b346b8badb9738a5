//! Latency sample recording and statistics

pub mod recorder;
pub mod report;

pub use recorder::{LatencyRecorder, TimedSample};
pub use report::LatencyReport;

use nix::time::{clock_gettime, ClockId};

use crate::error::{MqError, Result};

/// Monotonic clock reading in nanoseconds
///
/// Comparable across processes on the same machine, which is what makes the
/// cross-process latency computation meaningful.
pub fn monotonic_ns() -> Result<i64> {
    let ts = clock_gettime(ClockId::CLOCK_MONOTONIC)
        .map_err(|e| MqError::platform(format!("clock_gettime failed: {}", e)))?;
    Ok(ts.tv_sec() * 1_000_000_000 + ts.tv_nsec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_ns_advances() {
        let a = monotonic_ns().unwrap();
        let b = monotonic_ns().unwrap();
        assert!(b >= a);
        assert!(a > 0);
    }
}
