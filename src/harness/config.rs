//! Configuration for the latency measurement harness

use serde::{Deserialize, Serialize};

use crate::{config, queue::QueueConfig};

use super::message::TimedMessage;

/// Explicit harness configuration, passed in at startup
///
/// Both sides must agree on `queue_name`, `capacity` and `element_size` out
/// of band; everything else is per-process pacing and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Name of the shared queue
    pub queue_name: String,
    /// Queue capacity in elements
    pub capacity: usize,
    /// Fixed element size in bytes
    pub element_size: usize,
    /// Pause between messages (or bursts) in microseconds; 0 = no pause
    pub interval_us: u64,
    /// Messages sent back-to-back per interval; 0 = single messages
    pub burst: u32,
    /// SCHED_FIFO priority; 0 = leave scheduling untouched
    pub priority: i32,
    /// CPU affinity bit mask; 0 = leave affinity untouched
    pub affinity_mask: u64,
    /// Seconds before latency capture starts
    pub start_delay_secs: u64,
    /// Capture duration in seconds; 0 = unbounded
    pub duration_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            queue_name: config::DEFAULT_QUEUE_NAME.to_string(),
            capacity: config::DEFAULT_CAPACITY,
            element_size: config::DEFAULT_ELEMENT_SIZE,
            interval_us: 6_000,
            burst: 0,
            priority: 0,
            affinity_mask: 0,
            start_delay_secs: 0,
            duration_secs: 0,
        }
    }
}

impl HarnessConfig {
    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::MqError;

        if self.queue_name.is_empty() {
            return Err(MqError::invalid_parameter(
                "queue_name",
                "Queue name cannot be empty",
            ));
        }

        if self.capacity == 0 {
            return Err(MqError::invalid_parameter(
                "capacity",
                "Capacity must be greater than 0",
            ));
        }

        if self.element_size < TimedMessage::HEADER_SIZE {
            return Err(MqError::invalid_parameter(
                "element_size",
                format!(
                    "Element size must hold at least the {}-byte message header",
                    TimedMessage::HEADER_SIZE
                ),
            ));
        }

        Ok(())
    }

    /// Derive the queue configuration both sides open
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig::new(self.queue_name.as_str(), self.capacity, self.element_size)
    }
}
