use crate::config::validate_size;
use crate::invariants::{debug_assert_position_in_range, debug_assert_slot_reserved};
use crate::layout::{Field, ACK_NEW_DATA};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::{Backoff, ChannelError, Region, RegisterMap};

/// Host end of the channel: appends bytes and raises the ack bit.
///
/// **Producer (write path), per `publish_byte`:**
/// 1. Acquire-load `consumer_position` (a slot is reused only after the
///    consumer's Release store says it was read)
/// 2. Refuse if the next position would equal the consumer's
/// 3. Write the payload byte at `producer_position`
/// 4. Release-store the advanced `producer_position`
/// 5. Set ack bit 0
///
/// One slot always stays empty, so usable capacity is `configured_size - 1`.
pub struct Producer<R: Region> {
    regs: RegisterMap<R>,
    metrics: Metrics,
    enable_metrics: bool,
}

impl<R: Region> Producer<R> {
    /// Attaches to an established region.
    pub fn attach(region: R) -> Result<Self, ChannelError> {
        let regs = RegisterMap::new(region)?;
        regs.validate()?;
        log::info!(
            "producer attached: size={}, buffer_pos={}",
            regs.get(Field::ConfiguredSize),
            regs.get(Field::ProducerPosition)
        );
        Ok(Self {
            regs,
            metrics: Metrics::new(),
            enable_metrics: false,
        })
    }

    /// Enables or disables metrics collection.
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    #[inline]
    pub fn registers(&self) -> &RegisterMap<R> {
        &self.regs
    }

    #[inline]
    pub fn producer_position(&self) -> u32 {
        self.regs.get(Field::ProducerPosition)
    }

    #[inline]
    pub fn consumer_position(&self) -> u32 {
        self.regs.get(Field::ConsumerPosition)
    }

    /// Returns true while the consumer has not drained everything published.
    #[inline]
    pub fn is_ack_pending(&self) -> bool {
        self.regs.get(Field::Ack) & ACK_NEW_DATA != 0
    }

    /// Bytes that can be published before the ring is full.
    pub fn free_space(&self) -> u32 {
        let size = self.regs.get(Field::ConfiguredSize);
        let producer = self.producer_position();
        let consumer = self.consumer_position();
        if size == 0 {
            return 0;
        }
        let used = if producer >= consumer {
            producer - consumer
        } else {
            size.saturating_sub(consumer).saturating_add(producer)
        };
        (size - 1).saturating_sub(used)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_space() == 0
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        if self.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    /// Publishes one byte. Fails with [`ChannelError::Full`] when advancing
    /// would land on the consumer's position.
    pub fn publish_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        let size = self.regs.get(Field::ConfiguredSize);
        validate_size(size, self.regs.get(Field::Capacity))?;

        let producer = self.regs.get(Field::ProducerPosition);
        let consumer = self.regs.get(Field::ConsumerPosition);
        if producer >= size || consumer >= size {
            return Err(ChannelError::InvalidFieldAccess {
                offset: producer.max(consumer) as usize,
                len: size as usize,
            });
        }

        let next = (producer + 1) % size;
        if next == consumer {
            if self.enable_metrics {
                self.metrics.add_full_rejection();
            }
            log::trace!("buffer full at pos {producer} (read_pos={consumer})");
            return Err(ChannelError::Full);
        }

        self.regs.write_payload(producer, byte)?;

        debug_assert_position_in_range!("producer_position", next, size);
        debug_assert_slot_reserved!(next, consumer);
        self.regs.set(Field::ProducerPosition, next);
        self.regs.set_bits(Field::Ack, ACK_NEW_DATA);

        if self.enable_metrics {
            self.metrics.add_bytes_published(1);
        }
        log::debug!("wrote {:#04x} at pos {}", byte, producer);
        Ok(())
    }

    /// Publishes as many bytes of `bytes` as fit. Returns the count written.
    ///
    /// Stops quietly when the ring fills; any other error (a corrupt header)
    /// is returned.
    pub fn publish(&mut self, bytes: &[u8]) -> Result<usize, ChannelError> {
        let mut sent = 0;
        for &byte in bytes {
            match self.publish_byte(byte) {
                Ok(()) => sent += 1,
                Err(ChannelError::Full) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(sent)
    }

    /// Publishes one byte, polling with adaptive backoff while the ring is
    /// full. Gives up with [`ChannelError::Full`] once the backoff completes.
    pub fn publish_with_backoff(&mut self, byte: u8) -> Result<(), ChannelError> {
        let mut backoff = Backoff::new();
        loop {
            match self.publish_byte(byte) {
                Err(ChannelError::Full) if !backoff.is_completed() => backoff.snooze(),
                other => return other,
            }
        }
    }
}

impl<R: Region> std::fmt::Debug for Producer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("registers", &self.regs)
            .finish_non_exhaustive()
    }
}
