//! Fixed-layout timed message exchanged through the queue

use crate::error::{MqError, Result};
use crate::profiling::monotonic_ns;

/// Message header carried in the first bytes of every element: a monotonic
/// send timestamp followed by a sequence counter. The remainder of the
/// element is padding up to the agreed element size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMessage {
    /// Monotonic send timestamp in nanoseconds
    pub sent_ns: i64,
    /// Per-producer sequence counter
    pub sequence: u32,
}

impl TimedMessage {
    /// Encoded header size: i64 timestamp + u32 sequence
    pub const HEADER_SIZE: usize = std::mem::size_of::<i64>() + std::mem::size_of::<u32>();

    /// Build a message stamped with the current monotonic time
    pub fn stamped(sequence: u32) -> Result<Self> {
        Ok(Self {
            sent_ns: monotonic_ns()?,
            sequence,
        })
    }

    /// Write the header into the front of an element buffer
    pub fn encode_into(&self, element: &mut [u8]) -> Result<()> {
        if element.len() < Self::HEADER_SIZE {
            return Err(MqError::length_mismatch(Self::HEADER_SIZE, element.len()));
        }
        element[0..8].copy_from_slice(&self.sent_ns.to_ne_bytes());
        element[8..12].copy_from_slice(&self.sequence.to_ne_bytes());
        Ok(())
    }

    /// Read the header back from the front of an element buffer
    pub fn decode_from(element: &[u8]) -> Result<Self> {
        if element.len() < Self::HEADER_SIZE {
            return Err(MqError::length_mismatch(Self::HEADER_SIZE, element.len()));
        }
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&element[0..8]);
        let mut seq = [0u8; 4];
        seq.copy_from_slice(&element[8..12]);
        Ok(Self {
            sent_ns: i64::from_ne_bytes(ts),
            sequence: u32::from_ne_bytes(seq),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let message = TimedMessage {
            sent_ns: 123_456_789_000,
            sequence: 42,
        };
        let mut element = [0u8; 64];
        message.encode_into(&mut element).unwrap();

        let decoded = TimedMessage::decode_from(&element).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let message = TimedMessage {
            sent_ns: 1,
            sequence: 1,
        };
        let mut short = [0u8; 4];
        assert!(matches!(
            message.encode_into(&mut short),
            Err(MqError::LengthMismatch { .. })
        ));
        assert!(matches!(
            TimedMessage::decode_from(&short),
            Err(MqError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_stamped_uses_monotonic_clock() {
        let a = TimedMessage::stamped(1).unwrap();
        let b = TimedMessage::stamped(2).unwrap();
        assert!(b.sent_ns >= a.sent_ns);
    }
}
