//! Latency measurement harness: paced producer, recording consumer, and the
//! process-level plumbing around them (scheduling, affinity, keypress input)

pub mod config;
pub mod consumer;
pub mod keyboard;
pub mod message;
pub mod producer;
pub mod setup;

pub use config::HarnessConfig;
pub use consumer::run_consumer;
pub use message::TimedMessage;
pub use producer::run_producer;
