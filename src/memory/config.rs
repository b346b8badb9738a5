//! Configuration types for shared-memory segments

use serde::{Deserialize, Serialize};

/// Configuration for opening or creating a named shared-memory segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Name of the segment in the OS namespace
    pub name: String,
    /// Total size of the segment in bytes
    pub size: usize,
    /// Whether to create the segment if it doesn't exist
    pub create: bool,
    /// Permissions for a newly created segment (Unix permissions)
    pub permissions: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: 0,
            create: true,
            permissions: 0o600,
        }
    }
}

impl SegmentConfig {
    /// Create a new segment configuration
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            ..Default::default()
        }
    }

    /// Set whether to create the segment if it doesn't exist
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Set the permissions for a newly created segment
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::MqError;

        if self.name.is_empty() {
            return Err(MqError::invalid_parameter(
                "name",
                "Segment name cannot be empty",
            ));
        }

        if self.name.len() > 1 && self.name[1..].contains('/') {
            return Err(MqError::invalid_parameter(
                "name",
                "Segment name may contain at most a leading slash",
            ));
        }

        if self.size == 0 {
            return Err(MqError::invalid_parameter(
                "size",
                "Segment size must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Name normalized to the leading slash POSIX requires
    pub fn os_name(&self) -> String {
        if self.name.starts_with('/') {
            self.name.clone()
        } else {
            format!("/{}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(SegmentConfig::new("", 64).validate().is_err());
        assert!(SegmentConfig::new("q", 0).validate().is_err());
        assert!(SegmentConfig::new("a/b", 64).validate().is_err());
        assert!(SegmentConfig::new("queue", 64).validate().is_ok());
        assert!(SegmentConfig::new("/queue", 64).validate().is_ok());
    }

    #[test]
    fn test_os_name_normalization() {
        assert_eq!(SegmentConfig::new("queue", 64).os_name(), "/queue");
        assert_eq!(SegmentConfig::new("/queue", 64).os_name(), "/queue");
    }
}
