//! Error types for channel operations.

use thiserror::Error;

/// Errors reported by the register map and the channel endpoints.
///
/// An empty buffer is not an error: [`RingChannel::consume_one`] reports it
/// as `Ok(None)`.
///
/// [`RingChannel::consume_one`]: crate::RingChannel::consume_one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// An access fell outside the mapped region or the provisioned payload.
    #[error("invalid field access at offset {offset} (region length {len})")]
    InvalidFieldAccess {
        /// Byte offset that was requested.
        offset: usize,
        /// Length of the region or payload it was checked against.
        len: usize,
    },

    /// A buffer size outside `1..=capacity`.
    #[error("invalid buffer size {size} (capacity {capacity})")]
    InvalidSize {
        /// Requested or observed size.
        size: u32,
        /// Provisioned capacity.
        capacity: u32,
    },

    /// `reconfigure` was called while bytes are still pending.
    #[error("reconfigure rejected: buffer not drained (consumer {consumer}, producer {producer})")]
    ReconfigureRejected {
        /// Consumer position at the time of the request.
        consumer: u32,
        /// Producer position at the time of the request.
        producer: u32,
    },

    /// Publishing would make the producer position collide with the consumer's.
    #[error("ring buffer is full")]
    Full,

    /// The region cannot hold the header or the payload it declares.
    #[error("mapping unavailable: region holds {actual} bytes, {required} required")]
    MappingUnavailable {
        /// Bytes needed for the header plus payload.
        required: usize,
        /// Bytes actually mapped.
        actual: usize,
    },
}

impl ChannelError {
    /// Returns `true` if retrying later may succeed (`Full`, `ReconfigureRejected`).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full | Self::ReconfigureRejected { .. })
    }

    /// Returns `true` if this error is a violated precondition rather than
    /// a protocol state; callers must not retry these.
    #[inline]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidFieldAccess { .. }
                | Self::InvalidSize { .. }
                | Self::MappingUnavailable { .. }
        )
    }
}
