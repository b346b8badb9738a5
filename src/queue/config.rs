//! Configuration types for shared-memory queues

use serde::{Deserialize, Serialize};

use crate::memory::SegmentConfig;

/// Configuration for opening or creating a shared-memory queue
///
/// The name is the entire cross-process contract; capacity and element size
/// must be agreed out of band by every attaching process. There is no
/// size-negotiation handshake — a mismatched element size fails closed via
/// the per-operation length check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue name in the OS shared-memory namespace
    pub name: String,
    /// Maximum number of elements the ring holds
    pub capacity: usize,
    /// Fixed size of every element in bytes
    pub element_size: usize,
    /// Whether to create the queue if it doesn't exist
    pub create: bool,
    /// Permissions for a newly created queue (Unix permissions)
    pub permissions: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            capacity: 0,
            element_size: 0,
            create: true,
            permissions: 0o600,
        }
    }
}

impl QueueConfig {
    /// Create a new queue configuration
    pub fn new(name: impl Into<String>, capacity: usize, element_size: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            element_size,
            ..Default::default()
        }
    }

    /// Set whether to create the queue if it doesn't exist
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Set the permissions for a newly created queue
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Length of the data region in bytes
    pub fn data_len(&self) -> usize {
        self.capacity * self.element_size
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::MqError;

        if self.name.is_empty() {
            return Err(MqError::invalid_parameter(
                "name",
                "Queue name cannot be empty",
            ));
        }

        if self.capacity == 0 {
            return Err(MqError::invalid_parameter(
                "capacity",
                "Capacity must be greater than 0",
            ));
        }

        if self.element_size == 0 {
            return Err(MqError::invalid_parameter(
                "element_size",
                "Element size must be greater than 0",
            ));
        }

        if self.capacity.checked_mul(self.element_size).is_none() {
            return Err(MqError::invalid_parameter(
                "capacity",
                "capacity * element_size overflows",
            ));
        }

        Ok(())
    }

    /// Derive the backing segment configuration for a given total size
    pub(crate) fn segment_config(&self, total_size: usize) -> SegmentConfig {
        SegmentConfig::new(self.name.as_str(), total_size)
            .with_create(self.create)
            .with_permissions(self.permissions)
    }
}
