//! Named status/config attributes, in the style of sysfs device files.

use crate::DeviceError;
use std::str::FromStr;

/// A device attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Active buffer size (read/write).
    BufferSize,
    /// Provisioned capacity (read-only).
    MaxBufferSize,
    /// Multi-line handshake state (read-only).
    Status,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [
        Attribute::BufferSize,
        Attribute::MaxBufferSize,
        Attribute::Status,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Attribute::BufferSize => "buffer_size",
            Attribute::MaxBufferSize => "max_buffer_size",
            Attribute::Status => "status",
        }
    }

    pub const fn is_writable(self) -> bool {
        matches!(self, Attribute::BufferSize)
    }
}

impl FromStr for Attribute {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name() == s)
            .ok_or_else(|| DeviceError::UnknownAttribute(s.to_string()))
    }
}

/// Parses an unsigned integer with base auto-detection: `0x` hex, leading
/// `0` octal, decimal otherwise. One trailing newline is accepted, as when a
/// value is written with `echo`.
pub fn parse_u32(input: &str) -> Result<u32, DeviceError> {
    let trimmed = input.strip_suffix('\n').unwrap_or(input);
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let (digits, radix) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (hex, 16)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (&unsigned[1..], 8)
    } else {
        (unsigned, 10)
    };

    // from_str_radix accepts a sign of its own; one was already consumed above.
    if digits.starts_with(['+', '-']) {
        return Err(invalid(input));
    }

    u32::from_str_radix(digits, radix).map_err(|_| invalid(input))
}

fn invalid(input: &str) -> DeviceError {
    DeviceError::InvalidValue {
        input: input.to_string(),
    }
}
