use crate::config::validate_size;
use crate::invariants::{debug_assert_drained_before_clear, debug_assert_position_in_range};
use crate::layout::{Field, ACK_NEW_DATA};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::{ChannelConfig, ChannelError, ChannelStatus, Region, RegisterMap};

// =============================================================================
// CONSUMER PROTOCOL
// =============================================================================
//
// The consumer owns `consumer_position` and clears the ack bit; the producer
// owns `producer_position`, the payload bytes it appends, and sets the ack bit.
// No lock is shared between the two sides.
//
// **Consumer (read path), per `consume_one`:**
// 1. Acquire-load `configured_size` and `producer_position`
//    (the size may have been changed administratively since the last call)
// 2. Equal positions: nothing to read; clear a stale ack bit, return `Ok(None)`
// 3. Read the payload byte at `consumer_position` (ordered by step 1)
// 4. Release-store `(consumer_position + 1) mod configured_size`
// 5. If that equals the producer position from step 1, clear ack bit 0
//
// The producer position is re-read on every call, so bytes published while
// a drain is in progress are folded into the same drain. A producer publish
// racing with step 2 or 5 can leave the ack bit clear while positions differ;
// `has_pending_data` therefore compares positions, not the ack bit.
// =============================================================================

/// Consumer end of the shared-memory byte channel.
///
/// Holds no buffered data. The only local state is the last producer
/// position observed, kept for status reporting; the register file remains
/// the single source of truth.
pub struct RingChannel<R: Region> {
    regs: RegisterMap<R>,
    last_producer_position: u32,
    metrics: Metrics,
    enable_metrics: bool,
}

impl<R: Region> RingChannel<R> {
    /// Initializes the register file in `region` and returns its consumer.
    ///
    /// Writes capacity, configured size and payload offset from `config`, and
    /// zeroes both positions, the ack register and the status word.
    pub fn establish(region: R, config: ChannelConfig) -> Result<Self, ChannelError> {
        let regs = RegisterMap::new(region)?;
        regs.initialize(&config)?;

        log::info!(
            "channel established: capacity={}, size={}, buffer_start={:#x}",
            config.capacity,
            config.configured_size,
            config.buffer_start()
        );

        Ok(Self {
            regs,
            last_producer_position: 0,
            metrics: Metrics::new(),
            enable_metrics: config.enable_metrics,
        })
    }

    /// Attaches to a region whose header was already written.
    pub fn attach(region: R) -> Result<Self, ChannelError> {
        let regs = RegisterMap::new(region)?;
        regs.validate()?;
        let last_producer_position = regs.get(Field::ProducerPosition);

        log::info!(
            "channel attached: read_pos={}, buffer_pos={}",
            regs.get(Field::ConsumerPosition),
            last_producer_position
        );

        Ok(Self {
            regs,
            last_producer_position,
            metrics: Metrics::new(),
            enable_metrics: false,
        })
    }

    /// Enables or disables metrics collection.
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// The register file this channel runs on.
    #[inline]
    pub fn registers(&self) -> &RegisterMap<R> {
        &self.regs
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.regs.get(Field::Capacity)
    }

    #[inline]
    pub fn configured_size(&self) -> u32 {
        self.regs.get(Field::ConfiguredSize)
    }

    #[inline]
    pub fn consumer_position(&self) -> u32 {
        self.regs.get(Field::ConsumerPosition)
    }

    #[inline]
    pub fn producer_position(&self) -> u32 {
        self.regs.get(Field::ProducerPosition)
    }

    /// Raw ack register.
    #[inline]
    pub fn ack(&self) -> u32 {
        self.regs.get(Field::Ack)
    }

    /// Returns true if the producer's new-data bit is set.
    #[inline]
    pub fn is_ack_pending(&self) -> bool {
        self.ack() & ACK_NEW_DATA != 0
    }

    /// Producer position as of the last `consume_one` or `observe_producer`.
    #[inline]
    pub fn last_producer_position(&self) -> u32 {
        self.last_producer_position
    }

    /// Re-reads the producer position into the local cache and returns it.
    pub fn observe_producer(&mut self) -> u32 {
        self.last_producer_position = self.producer_position();
        self.last_producer_position
    }

    /// Returns true iff at least one unread byte exists. Performs no writes.
    #[inline]
    pub fn has_pending_data(&self) -> bool {
        self.consumer_position() != self.producer_position()
    }

    /// Number of unread bytes.
    pub fn len(&self) -> u32 {
        let size = self.configured_size();
        let consumer = self.consumer_position();
        let producer = self.producer_position();
        if size == 0 {
            return 0;
        }
        if producer >= consumer {
            producer - consumer
        } else {
            // Wrapped: producer is behind consumer in raw index order.
            size.saturating_sub(consumer).saturating_add(producer)
        }
    }

    /// Returns true if no byte is pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.has_pending_data()
    }

    /// Snapshot of the registers for the administrative interface.
    pub fn status(&self) -> ChannelStatus {
        ChannelStatus::capture(&self.regs)
    }

    /// Snapshot of metrics, or all zeros if metrics are disabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    // ---------------------------------------------------------------------
    // READ PATH
    // ---------------------------------------------------------------------

    /// Consumes one byte.
    ///
    /// Returns `Ok(None)` when the buffer is empty; that is the normal polling
    /// outcome, not a failure. Never blocks.
    pub fn consume_one(&mut self) -> Result<Option<u8>, ChannelError> {
        let size = self.regs.get(Field::ConfiguredSize);
        let producer = self.regs.get(Field::ProducerPosition);
        let consumer = self.regs.get(Field::ConsumerPosition);
        self.last_producer_position = producer;

        if consumer == producer {
            // A publish whose ack store landed after our last clear leaves
            // the bit raised over a drained buffer; caught up, so drop it.
            if self.is_ack_pending() {
                self.regs.clear_bits(Field::Ack, ACK_NEW_DATA);
                log::debug!("stale ack cleared at pos {consumer}");
            }
            if self.enable_metrics {
                self.metrics.add_empty_poll();
            }
            log::trace!("no new data (read_pos={consumer})");
            return Ok(None);
        }

        validate_size(size, self.regs.get(Field::Capacity))?;
        if consumer >= size || producer >= size {
            return Err(ChannelError::InvalidFieldAccess {
                offset: consumer.max(producer) as usize,
                len: size as usize,
            });
        }

        let byte = self.regs.read_payload(consumer)?;

        let next = (consumer + 1) % size;
        debug_assert_position_in_range!("consumer_position", next, size);
        self.regs.set(Field::ConsumerPosition, next);

        log::debug!(
            "read {:#04x} from pos {} (buffer_pos={})",
            byte,
            consumer,
            producer
        );

        if next == producer {
            debug_assert_drained_before_clear!(next, producer);
            self.regs.clear_bits(Field::Ack, ACK_NEW_DATA);
            if self.enable_metrics {
                self.metrics.add_drain();
            }
            log::debug!("all data read, ack cleared at pos {next}");
        }

        if self.enable_metrics {
            self.metrics.add_bytes_consumed(1);
        }

        Ok(Some(byte))
    }

    /// Consumes up to `out.len()` bytes, stopping early when the buffer
    /// empties. Returns the number of bytes written to `out`.
    pub fn drain_into(&mut self, out: &mut [u8]) -> Result<usize, ChannelError> {
        let mut n = 0;
        while n < out.len() {
            match self.consume_one()? {
                Some(byte) => {
                    out[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    // ---------------------------------------------------------------------
    // ADMINISTRATION
    // ---------------------------------------------------------------------

    /// Changes the active buffer size and resets the channel to empty.
    ///
    /// Rejected while bytes are pending (positions differ or the ack bit is
    /// set), unless both positions are already at zero. Drain the buffer or
    /// use [`force_reset`](Self::force_reset) first.
    pub fn reconfigure(&mut self, new_size: u32) -> Result<(), ChannelError> {
        validate_size(new_size, self.capacity())?;

        let consumer = self.consumer_position();
        let producer = self.producer_position();
        let drained = consumer == producer && !self.is_ack_pending();
        let at_origin = consumer == 0 && producer == 0;

        if !drained && !at_origin {
            log::warn!(
                "reconfigure to {new_size} rejected: read_pos={consumer}, buffer_pos={producer}"
            );
            return Err(ChannelError::ReconfigureRejected { consumer, producer });
        }

        self.reset_to(new_size);
        log::info!("buffer size set to {new_size}");
        Ok(())
    }

    /// Hard reset: discards pending bytes, sets the active size, and returns
    /// both positions and the ack bit to the empty state.
    pub fn force_reset(&mut self, new_size: u32) -> Result<(), ChannelError> {
        validate_size(new_size, self.capacity())?;

        let discarded = self.len();
        if discarded > 0 {
            log::warn!("force reset discards {discarded} unread bytes");
        }

        self.reset_to(new_size);
        log::info!("channel reset, buffer size {new_size}");
        Ok(())
    }

    fn reset_to(&mut self, new_size: u32) {
        self.regs.set(Field::ProducerPosition, 0);
        self.regs.set(Field::ConsumerPosition, 0);
        self.regs.set(Field::ConfiguredSize, new_size);
        self.regs.set(Field::Ack, 0);
        self.last_producer_position = 0;
        if self.enable_metrics {
            self.metrics.add_reset();
        }
    }

    // ---------------------------------------------------------------------
    // LIFECYCLE
    // ---------------------------------------------------------------------

    /// Releases the channel, returning the region to its owner.
    pub fn into_region(self) -> R {
        self.regs.into_region()
    }
}

impl<R: Region> std::fmt::Debug for RingChannel<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingChannel")
            .field("registers", &self.regs)
            .field("last_producer_position", &self.last_producer_position)
            .finish_non_exhaustive()
    }
}
