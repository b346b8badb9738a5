//! Cross-process shared-memory queue

pub mod config;
pub(crate) mod control;
pub mod shared;


pub use config::QueueConfig;
pub use shared::SharedQueue;
