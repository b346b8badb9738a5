//! # mqperf - IPC latency measurement over shared memory
//!
//! mqperf measures cross-process message latency through a hand-built
//! shared-memory queue: a fixed-capacity ring of fixed-size elements,
//! synchronized by a mutex and condition variable that live inside the
//! mapped region and are configured for cross-process visibility.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              Shared-memory region               │
//! ├─────────────────────────────────────────────────┤
//! │  Control block            │  Data ring          │
//! │  - pshared mutex          │  - capacity *       │
//! │  - pshared condvar        │    element_size     │
//! │  - semaphore counter      │    bytes            │
//! │  - read/write cursors     │                     │
//! └─────────────────────────────────────────────────┘
//!       ▲                            ▲
//!       │                            │
//! ┌───────────────┐        ┌──────────────────┐
//! │  xmit process │        │   recv process   │
//! │  (producer)   │        │   (consumer +    │
//! │               │        │    recorder)     │
//! └───────────────┘        └──────────────────┘
//! ```
//!
//! The producer stamps each element with a monotonic send time and a
//! sequence counter; the consumer dequeues the same bytes in another
//! address space and feeds send/capture pairs to the latency recorder,
//! which reports min/max/mean/median/variance/deviation and a histogram.

// Core modules
pub mod error;
pub mod memory;
pub mod profiling;
pub mod queue;

// Measurement harness
pub mod harness;

// Main API re-exports
pub use error::{MqError, Result};
pub use harness::{run_consumer, run_producer, HarnessConfig, TimedMessage};
pub use memory::{SegmentConfig, SharedSegment};
pub use profiling::{monotonic_ns, LatencyRecorder, LatencyReport};
pub use queue::{QueueConfig, SharedQueue};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
///
/// Capacity and element size are part of the out-of-band contract between
/// producer and consumer; both sides must use the same values.
pub mod config {
    /// Default queue name in the shared-memory namespace
    pub const DEFAULT_QUEUE_NAME: &str = "mq-perf";

    /// Default queue capacity in elements
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Payload bytes carried per message
    pub const DEFAULT_PAYLOAD_SIZE: usize = 256;

    /// Default element size: payload plus the timestamp/sequence header
    pub const DEFAULT_ELEMENT_SIZE: usize =
        DEFAULT_PAYLOAD_SIZE + crate::harness::TimedMessage::HEADER_SIZE;

    /// Maximum latency samples captured per run
    pub const DEFAULT_MAX_SAMPLES: usize = 1_000_000;

    /// Samples trimmed from each end of a capture before statistics
    pub const MEASURE_SAFETY_MARGIN: usize = 100;
}
