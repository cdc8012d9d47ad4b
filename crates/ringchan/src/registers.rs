use crate::config::validate_size;
use crate::layout::{Field, HEADER_LEN, REGISTER_WIDTH};
use crate::{ChannelConfig, ChannelError, Region};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

// =============================================================================
// ACCESS ORDERING
// =============================================================================
//
// Every header register is read with a single 32-bit Acquire load and written
// with a single 32-bit Release store (or an AcqRel read-modify-write for the
// ack bits), so neither side can observe a torn register, and a position store
// is never visible before the payload access that preceded it.
//
// Payload bytes use Relaxed 8-bit accesses. They are ordered by the position
// registers: the producer writes a byte before its Release store of
// `producer_position`, and the consumer reads it after its Acquire load of the
// same register.
//
// Nothing is cached here. Every `get` reads the region.
// =============================================================================

/// Typed view over the shared register file.
///
/// Translates [`Field`]s into offsets and performs ordered, atomic-width
/// accesses. Carries no protocol knowledge; see [`RingChannel`] and
/// [`Producer`] for that.
///
/// [`RingChannel`]: crate::RingChannel
/// [`Producer`]: crate::Producer
pub struct RegisterMap<R: Region> {
    region: R,
}

impl<R: Region> RegisterMap<R> {
    /// Wraps a region large enough to hold the register header.
    pub fn new(region: R) -> Result<Self, ChannelError> {
        let actual = region.len();
        if actual < HEADER_LEN {
            return Err(ChannelError::MappingUnavailable {
                required: HEADER_LEN,
                actual,
            });
        }
        debug_assert_eq!(
            region.as_ptr() as usize % REGISTER_WIDTH,
            0,
            "region base must be 4-byte aligned"
        );
        Ok(Self { region })
    }

    /// The underlying region.
    #[inline]
    pub fn region(&self) -> &R {
        &self.region
    }

    /// Consumes the map, returning the region.
    pub fn into_region(self) -> R {
        self.region
    }

    #[inline]
    #[allow(clippy::cast_ptr_alignment)]
    fn register(&self, field: Field) -> &AtomicU32 {
        // SAFETY: `new` checked that the header fits inside the region; the
        // base is 4-byte aligned (Region contract) and every field offset is a
        // multiple of 4. The region outlives `&self`.
        unsafe { &*self.region.as_ptr().add(field.offset()).cast::<AtomicU32>() }
    }

    /// Reads a header register.
    #[inline]
    pub fn get(&self, field: Field) -> u32 {
        self.register(field).load(Ordering::Acquire)
    }

    /// Writes a header register.
    #[inline]
    pub fn set(&self, field: Field, value: u32) {
        self.register(field).store(value, Ordering::Release);
    }

    /// Sets `bits` in a register, leaving other bits untouched. Returns the
    /// previous value.
    #[inline]
    pub fn set_bits(&self, field: Field, bits: u32) -> u32 {
        self.register(field).fetch_or(bits, Ordering::AcqRel)
    }

    /// Clears `bits` in a register, leaving other bits untouched. Returns the
    /// previous value.
    #[inline]
    pub fn clear_bits(&self, field: Field, bits: u32) -> u32 {
        self.register(field).fetch_and(!bits, Ordering::AcqRel)
    }

    /// Resolves payload `index` to its byte cell.
    ///
    /// The index must lie inside the provisioned capacity and the resulting
    /// offset inside the region; anything else is [`ChannelError::InvalidFieldAccess`].
    fn payload(&self, index: u32) -> Result<&AtomicU8, ChannelError> {
        let capacity = self.get(Field::Capacity) as usize;
        let start = self.get(Field::BufferStart) as usize;
        let index = index as usize;
        let len = self.region.len();

        if index >= capacity {
            return Err(ChannelError::InvalidFieldAccess {
                offset: index,
                len: capacity,
            });
        }
        let offset = start.saturating_add(index);
        if start < HEADER_LEN || offset >= len {
            return Err(ChannelError::InvalidFieldAccess { offset, len });
        }

        // SAFETY: offset < len and lies past the header; AtomicU8 has no
        // alignment requirement.
        Ok(unsafe { &*self.region.as_ptr().add(offset).cast::<AtomicU8>() })
    }

    /// Reads the payload byte at `index` (relative to `buffer_start`).
    #[inline]
    pub fn read_payload(&self, index: u32) -> Result<u8, ChannelError> {
        Ok(self.payload(index)?.load(Ordering::Relaxed))
    }

    /// Writes the payload byte at `index` (relative to `buffer_start`).
    #[inline]
    pub fn write_payload(&self, index: u32, byte: u8) -> Result<(), ChannelError> {
        self.payload(index)?.store(byte, Ordering::Relaxed);
        Ok(())
    }

    /// Writes the establishment state: geometry from `config`, positions,
    /// ack and status zeroed.
    pub fn initialize(&self, config: &ChannelConfig) -> Result<(), ChannelError> {
        config.validate()?;
        let required = config.region_len();
        let actual = self.region.len();
        if actual < required {
            return Err(ChannelError::MappingUnavailable { required, actual });
        }

        self.set(Field::Capacity, config.capacity);
        self.set(Field::ConfiguredSize, config.configured_size);
        self.set(Field::BufferStart, config.buffer_start());
        self.set(Field::ConsumerPosition, 0);
        self.set(Field::ProducerPosition, 0);
        self.set(Field::Ack, 0);
        self.set(Field::Status, 0);
        Ok(())
    }

    /// Checks a header written by the other side: the declared payload must
    /// fit in the region, the active size must be in `1..=capacity`, and both
    /// positions must lie below the active size.
    pub fn validate(&self) -> Result<(), ChannelError> {
        let capacity = self.get(Field::Capacity);
        let start = self.get(Field::BufferStart);
        let actual = self.region.len();

        if (start as usize) < HEADER_LEN {
            return Err(ChannelError::InvalidFieldAccess {
                offset: start as usize,
                len: actual,
            });
        }
        let required = start as usize + capacity as usize;
        if actual < required {
            return Err(ChannelError::MappingUnavailable { required, actual });
        }

        let size = self.get(Field::ConfiguredSize);
        validate_size(size, capacity)?;

        for field in [Field::ConsumerPosition, Field::ProducerPosition] {
            let pos = self.get(field);
            if pos >= size {
                return Err(ChannelError::InvalidFieldAccess {
                    offset: pos as usize,
                    len: size as usize,
                });
            }
        }
        Ok(())
    }
}

impl<R: Region> std::fmt::Debug for RegisterMap<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("RegisterMap");
        for field in Field::ALL {
            dbg.field(field.name(), &self.get(field));
        }
        dbg.field("region_len", &self.region.len()).finish()
    }
}
