//! Single-process demonstration of a full timed round trip: one producer
//! thread sends timestamped messages through the shared queue, the main
//! thread consumes them and prints latency statistics.
//!
//! Run with: cargo run --example latency_roundtrip

use mqperf::{LatencyRecorder, MqError, QueueConfig, SharedQueue, TimedMessage};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MESSAGES: usize = 2_000;
const ELEMENT_SIZE: usize = 64;

fn main() -> mqperf::Result<()> {
    env_logger::init();

    let name = format!("mqperf_demo_{}", std::process::id());
    let queue = Arc::new(SharedQueue::open_or_create(QueueConfig::new(
        name,
        32,
        ELEMENT_SIZE,
    ))?);
    println!(
        "queue '{}' with {} elements of {} bytes",
        queue.name(),
        queue.capacity(),
        queue.element_size()
    );

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || -> mqperf::Result<()> {
            let mut element = vec![0u8; ELEMENT_SIZE];
            for sequence in 1..=MESSAGES as u32 {
                let message = TimedMessage::stamped(sequence)?;
                message.encode_into(&mut element)?;
                loop {
                    match queue.try_enqueue_signal(&element) {
                        Ok(()) => break,
                        Err(MqError::QueueFull { .. }) => std::hint::spin_loop(),
                        Err(e) => return Err(e),
                    }
                }
                // Light pacing keeps the ring from saturating
                thread::sleep(Duration::from_micros(50));
            }
            Ok(())
        })
    };

    let mut recorder = LatencyRecorder::new(MESSAGES);
    let mut element = vec![0u8; ELEMENT_SIZE];
    let mut received = 0usize;
    while received < MESSAGES {
        match queue.dequeue(&mut element) {
            Ok(()) => {
                let message = TimedMessage::decode_from(&element)?;
                recorder.record(message.sent_ns)?;
                received += 1;
            }
            Err(MqError::SpuriousEmpty) => continue,
            Err(e) => return Err(e),
        }
    }

    producer
        .join()
        .map_err(|_| MqError::platform("producer thread panicked"))??;

    println!("received {} messages", received);
    match recorder.process(0) {
        Some(report) => print!("{}", report),
        None => println!("not enough samples for statistics"),
    }

    match Arc::try_unwrap(queue) {
        Ok(queue) => queue.destroy(true)?,
        Err(_) => log::warn!("queue handle still shared at shutdown"),
    }

    Ok(())
}
