//! Latency test transmitter: paces timestamped messages into the shared queue

use clap::{App, Arg};
use mqperf::{
    config,
    harness::{self, keyboard},
    HarnessConfig, MqError, Result, SharedQueue,
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

    let matches = App::new("mqperf-xmit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Low level IPC latency test application (xmit part)")
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
            Arg::with_name("burst")
                .short("b")
                .long("burst")
                .value_name("COUNT")
                .help("Number of messages sent as a burst (0 = no burst)")
                .default_value("0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("time")
                .short("t")
                .long("time")
                .value_name("MICROS")
                .help("Time interval between messages in microseconds (0 = no wait)")
                .default_value("6000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("prio")
                .short("p")
                .long("prio")
                .value_name("PRIO")
                .help("Thread priority (FIFO scheduling)")
                .default_value("40")
                .takes_value(true),
        )
        .get_matches();

    let harness_config = HarnessConfig {
        queue_name: matches.value_of("name").unwrap().to_string(),
        interval_us: parse_arg(&matches, "time")?,
        burst: parse_arg(&matches, "burst")?,
        priority: parse_arg(&matches, "prio")?,
        affinity_mask: parse_hex_arg(&matches, "mask")?,
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
        thread::spawn(move || harness::run_producer(&queue, &worker_config, &running))
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

    let sent = worker
        .join()
        .map_err(|_| MqError::platform("producer thread panicked"))??;
    println!("messages sent : {}", sent);

    // Removing the name on the transmit side is this pair's convention;
    // the receiver only detaches.
    match Arc::try_unwrap(queue) {
        Ok(queue) => queue.destroy(true)?,
        Err(_) => log::warn!("queue handle still shared at shutdown, skipping unlink"),
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
