//! Consumer side of the latency harness

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    error::{MqError, Result},
    profiling::LatencyRecorder,
    queue::SharedQueue,
};

use super::{config::HarnessConfig, message::TimedMessage, setup};

/// Receive messages and record their latency until `running` is cleared
///
/// Uses the blocking dequeue, so the loop only observes a cleared flag after
/// the next wakeup — the same applies to the original transport this
/// harness measures. Spurious-empty wakeups are recoverable and retried.
/// Returns the number of messages received.
pub fn run_consumer(
    queue: &SharedQueue,
    config: &HarnessConfig,
    running: &AtomicBool,
    recorder: &mut LatencyRecorder,
) -> Result<u64> {
    setup::apply_thread_setup("mq_recv", config);

    log::info!("start receive shmem with prio [{}]", config.priority);

    let mut element = vec![0u8; config.element_size];
    let mut received: u64 = 0;

    while running.load(Ordering::Relaxed) {
        match queue.dequeue(&mut element) {
            Ok(()) => {
                let message = TimedMessage::decode_from(&element)?;
                recorder.record(message.sent_ns)?;
                received += 1;
            }
            // Recoverable anomaly, already logged by the queue
            Err(MqError::SpuriousEmpty) => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(received)
}
