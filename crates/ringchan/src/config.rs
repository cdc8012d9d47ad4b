use crate::layout::{region_len, DEFAULT_BUFFER_START};
use crate::ChannelError;

/// Configuration used when a channel is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Payload bytes provisioned in the region (default: 30720)
    pub capacity: u32,
    /// Initial active buffer size, `1..=capacity`
    pub configured_size: u32,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl ChannelConfig {
    /// Default provisioned payload size (30 KiB).
    pub const DEFAULT_CAPACITY: u32 = 30 * 1024;

    /// Creates a new configuration with custom settings.
    pub const fn new(capacity: u32, configured_size: u32, enable_metrics: bool) -> Self {
        Self {
            capacity,
            configured_size,
            enable_metrics,
        }
    }

    /// Configuration whose active size equals the provisioned capacity.
    pub const fn with_capacity(capacity: u32) -> Self {
        Self::new(capacity, capacity, false)
    }

    /// Sets the active buffer size.
    pub const fn with_configured_size(mut self, configured_size: u32) -> Self {
        self.configured_size = configured_size;
        self
    }

    /// Enables or disables metrics.
    pub const fn with_metrics(mut self, enable_metrics: bool) -> Self {
        self.enable_metrics = enable_metrics;
        self
    }

    /// Bytes one byte short of the active size; one slot stays reserved so a
    /// full ring never looks empty.
    #[inline]
    pub const fn usable(&self) -> u32 {
        self.configured_size.saturating_sub(1)
    }

    /// Bytes a region must span for this configuration.
    #[inline]
    pub const fn region_len(&self) -> usize {
        region_len(self.capacity)
    }

    /// Payload offset written into the header.
    #[inline]
    pub const fn buffer_start(&self) -> u32 {
        DEFAULT_BUFFER_START
    }

    /// Checks `1 <= configured_size <= capacity`.
    pub fn validate(&self) -> Result<(), ChannelError> {
        validate_size(self.configured_size, self.capacity)
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

/// Small ring for tests and latency-sensitive links (256 bytes).
pub const SMALL_CONFIG: ChannelConfig = ChannelConfig::new(256, 256, false);

/// Large ring with metrics enabled (256 KiB).
pub const BULK_CONFIG: ChannelConfig = ChannelConfig::new(256 * 1024, 256 * 1024, true);

pub(crate) fn validate_size(size: u32, capacity: u32) -> Result<(), ChannelError> {
    if size == 0 || size > capacity {
        return Err(ChannelError::InvalidSize { size, capacity });
    }
    Ok(())
}
