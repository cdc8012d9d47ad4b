//! Error types for device operations.

use ringchan::ChannelError;
use thiserror::Error;

/// Errors surfaced by the device shell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The channel rejected the operation.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// An attribute write could not be parsed as an unsigned integer.
    #[error("invalid value {input:?}: expected an unsigned integer")]
    InvalidValue { input: String },

    /// No attribute with this name.
    #[error("unknown attribute {0:?}")]
    UnknownAttribute(String),

    /// The attribute cannot be written.
    #[error("attribute {0} is read-only")]
    ReadOnly(&'static str),

    /// Unrecognized ioctl request code (ENOTTY).
    #[error("inappropriate ioctl for device: {0:#010x}")]
    UnknownCommand(u32),
}

impl DeviceError {
    /// Returns `true` if the same request may succeed later, e.g. a
    /// `buffer_size` write rejected because the buffer was not yet drained.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Channel(e) if e.is_recoverable())
    }
}
