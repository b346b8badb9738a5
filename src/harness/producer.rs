//! Producer side of the latency harness

use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use crate::{
    error::{MqError, Result},
    queue::SharedQueue,
};

use super::{config::HarnessConfig, message::TimedMessage, setup};

/// Send timestamped messages until `running` is cleared
///
/// Paces messages by `interval_us`, optionally in bursts. A full ring is
/// busy-retried until space appears or the harness is stopped (retry-vs-drop
/// is harness policy, not the queue's). Returns the number of messages sent.
pub fn run_producer(
    queue: &SharedQueue,
    config: &HarnessConfig,
    running: &AtomicBool,
) -> Result<u64> {
    setup::apply_thread_setup("mq_xmit", config);

    log::info!(
        "start sending shmem with interval [{}] burst [{}] prio [{}]",
        config.interval_us,
        config.burst,
        config.priority
    );

    let mut element = vec![0u8; config.element_size];
    let mut burst_left = config.burst;
    let mut sequence: u32 = 0;
    let mut sent: u64 = 0;

    while running.load(Ordering::Relaxed) {
        if burst_left == 0 && config.interval_us > 0 {
            thread::sleep(Duration::from_micros(config.interval_us));
            burst_left = config.burst;
        }

        if burst_left > 0 {
            burst_left -= 1;
        }

        sequence = sequence.wrapping_add(1);
        let message = TimedMessage::stamped(sequence)?;
        message.encode_into(&mut element)?;

        loop {
            match queue.try_enqueue_signal(&element) {
                Ok(()) => {
                    sent += 1;
                    break;
                }
                Err(MqError::QueueFull { .. }) => {
                    if !running.load(Ordering::Relaxed) {
                        break;
                    }
                    std::hint::spin_loop();
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueConfig;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    fn unique_config(tag: &str) -> HarnessConfig {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        HarnessConfig {
            queue_name: format!(
                "mqperf_prod_{}_{}_{}",
                tag,
                std::process::id(),
                COUNTER.fetch_add(1, Ordering::SeqCst)
            ),
            capacity: 8,
            element_size: 32,
            interval_us: 0,
            burst: 0,
            priority: 0,
            affinity_mask: 0,
            start_delay_secs: 0,
            duration_secs: 0,
        }
    }

    #[test]
    fn test_producer_stops_on_flag() {
        let config = unique_config("stop");
        let queue = Arc::new(
            SharedQueue::open_or_create(QueueConfig::new(
                config.queue_name.as_str(),
                config.capacity,
                config.element_size,
            ))
            .unwrap(),
        );
        let running = Arc::new(AtomicBool::new(true));

        let worker = {
            let queue = Arc::clone(&queue);
            let config = config.clone();
            let running = Arc::clone(&running);
            thread::spawn(move || run_producer(&queue, &config, &running))
        };

        // Producer fills the 8-element ring, then spins on full until stopped
        thread::sleep(Duration::from_millis(50));
        running.store(false, Ordering::Relaxed);
        let sent = worker.join().unwrap().unwrap();

        assert_eq!(sent, 8);
        assert!(queue.is_full().unwrap());

        let mut out = vec![0u8; 32];
        queue.try_dequeue(&mut out).unwrap();
        let first = TimedMessage::decode_from(&out).unwrap();
        assert_eq!(first.sequence, 1);

        match Arc::try_unwrap(queue) {
            Ok(queue) => queue.destroy(true).unwrap(),
            Err(_) => panic!("queue still shared"),
        }
    }
}
