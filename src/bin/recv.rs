//! Latency test receiver: drains the shared queue and reports statistics

use clap::{App, Arg};
use mqperf::{
    config,
    harness::{self, keyboard},
    HarnessConfig, LatencyRecorder, MqError, Result, SharedQueue,
};
use std::{
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("mqperf-recv")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Low level IPC latency test application (recv part)")
        .arg(
            Arg::with_name("name")
                .short("n")
                .long("name")
                .value_name("NAME")
                .help("Shared queue name")
                .default_value(config::DEFAULT_QUEUE_NAME)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("mask")
                .short("m")
                .long("mask")
                .value_name("MASK")
                .help("CPU affinity mask (hex)")
                .default_value("0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("prio")
                .short("p")
                .long("prio")
                .value_name("PRIO")
                .help("Thread priority (FIFO scheduling)")
                .default_value("50")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("start")
                .short("s")
                .long("start")
                .value_name("SECS")
                .help("Time in seconds before capturing timestamps starts")
                .default_value("0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("duration")
                .short("d")
                .long("duration")
                .value_name("SECS")
                .help("Duration in seconds while timestamps are captured (0 = unbounded)")
                .default_value("0")
                .takes_value(true),
        )
        .get_matches();

    let harness_config = HarnessConfig {
        queue_name: matches.value_of("name").unwrap().to_string(),
        priority: parse_arg(&matches, "prio")?,
        affinity_mask: parse_hex_arg(&matches, "mask")?,
        start_delay_secs: parse_arg(&matches, "start")?,
        duration_secs: parse_arg(&matches, "duration")?,
        ..Default::default()
    };
    harness_config.validate()?;

    let queue = Arc::new(SharedQueue::open_or_create(harness_config.queue_config())?);
    println!(
        "queue '{}': {} elements of {} bytes ({})",
        queue.name(),
        queue.capacity(),
        queue.element_size(),
        if queue.was_created() {
            "created"
        } else {
            "attached"
        }
    );

    let running = Arc::new(AtomicBool::new(true));
    let worker = {
        let queue = Arc::clone(&queue);
        let worker_config = harness_config.clone();
        let running = Arc::clone(&running);
        thread::spawn(move || -> Result<(u64, LatencyRecorder)> {
            let mut recorder = LatencyRecorder::with_window(
                config::DEFAULT_MAX_SAMPLES,
                worker_config.start_delay_secs,
                worker_config.duration_secs,
            )?;
            let received = harness::run_consumer(&queue, &worker_config, &running, &mut recorder)?;
            Ok((received, recorder))
        })
    };

    while running.load(Ordering::Relaxed) {
        print!("\nEnter command : ");
        std::io::stdout().flush().ok();
        match keyboard::read_one_char() {
            Ok('q') => {
                println!("\n--> quit");
                running.store(false, Ordering::Relaxed);
            }
            Ok('h') => {
                println!("\nq.) exit application");
                println!("h.) this help");
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("keyboard input unavailable, stopping: {}", e);
                running.store(false, Ordering::Relaxed);
            }
        }
    }

    // The consumer sits in a blocking dequeue with no timeout; it exits
    // after the transmitter's next message wakes it.
    let (received, recorder) = worker
        .join()
        .map_err(|_| MqError::platform("consumer thread panicked"))??;
    println!("messages received : {}", received);

    match recorder.process(config::MEASURE_SAFETY_MARGIN) {
        Some(report) => print!("{}", report),
        None => println!("not enough samples captured for statistics"),
    }

    // The transmit side owns the final unlink; this side only detaches.
    match Arc::try_unwrap(queue) {
        Ok(queue) => queue.destroy(false)?,
        Err(_) => log::warn!("queue handle still shared at shutdown"),
    }

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Result<T> {
    matches
        .value_of(name)
        .unwrap()
        .parse()
        .map_err(|_| MqError::invalid_parameter(name, "Invalid numeric value"))
}

fn parse_hex_arg(matches: &clap::ArgMatches, name: &str) -> Result<u64> {
    let value = matches.value_of(name).unwrap();
    let digits = value.trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|_| MqError::invalid_parameter(name, "Invalid hex mask"))
}
