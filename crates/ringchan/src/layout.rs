//! Register file layout shared by both ends of the channel.
//!
//! ```text
//!  0x00 +-------------------+
//!       | capacity          |  provisioned payload size (read-only after init)
//!  0x04 +-------------------+
//!       | configured_size   |  active modulus, 1 ..= capacity
//!  0x08 +-------------------+
//!       | buffer_start      |  payload offset within the region
//!  0x0C +-------------------+
//!       | consumer_position |  written by the consumer only
//!  0x10 +-------------------+
//!       | producer_position |  written by the producer only
//!  0x14 +-------------------+
//!       | ack               |  bit 0: new data pending
//!  0x18 +-------------------+
//!       | status            |  reserved
//!  0x1C +-------------------+
//!       | payload ...       |  `capacity` bytes
//!       +-------------------+
//! ```

/// A 32-bit register in the header of the shared region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Maximum buffer size the region was provisioned for.
    Capacity,
    /// Currently active logical buffer size.
    ConfiguredSize,
    /// Byte offset of the payload area.
    BufferStart,
    /// Index of the next byte the consumer will read.
    ConsumerPosition,
    /// Index of the next byte the producer will write.
    ProducerPosition,
    /// Acknowledgment bit-field, see [`ACK_NEW_DATA`].
    Ack,
    /// Reserved status word.
    Status,
}

impl Field {
    /// All header registers in layout order.
    pub const ALL: [Field; 7] = [
        Field::Capacity,
        Field::ConfiguredSize,
        Field::BufferStart,
        Field::ConsumerPosition,
        Field::ProducerPosition,
        Field::Ack,
        Field::Status,
    ];

    /// Byte offset of the register within the region.
    #[inline]
    pub const fn offset(self) -> usize {
        match self {
            Field::Capacity => 0x00,
            Field::ConfiguredSize => 0x04,
            Field::BufferStart => 0x08,
            Field::ConsumerPosition => 0x0C,
            Field::ProducerPosition => 0x10,
            Field::Ack => 0x14,
            Field::Status => 0x18,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Field::Capacity => "capacity",
            Field::ConfiguredSize => "configured_size",
            Field::BufferStart => "buffer_start",
            Field::ConsumerPosition => "consumer_position",
            Field::ProducerPosition => "producer_position",
            Field::Ack => "ack",
            Field::Status => "status",
        }
    }
}

/// Width of every header register in bytes.
pub const REGISTER_WIDTH: usize = 4;

/// Size of the register header; also the default payload offset.
pub const HEADER_LEN: usize = 0x1C;

/// Payload offset written at establishment.
pub const DEFAULT_BUFFER_START: u32 = HEADER_LEN as u32;

/// Ack bit 0: the producer has published bytes the consumer has not drained.
pub const ACK_NEW_DATA: u32 = 1 << 0;

/// Bytes a region must span to hold the header and `capacity` payload bytes.
#[inline]
pub const fn region_len(capacity: u32) -> usize {
    HEADER_LEN + capacity as usize
}
