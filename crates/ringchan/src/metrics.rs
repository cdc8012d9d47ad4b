use std::sync::atomic::{AtomicU64, Ordering};

/// Optional counters for one channel endpoint.
///
/// Recorded only when [`ChannelConfig::enable_metrics`] is set; updated with
/// Relaxed atomics since they never order protocol state.
///
/// [`ChannelConfig::enable_metrics`]: crate::ChannelConfig::enable_metrics
#[derive(Debug, Default)]
pub struct Metrics {
    bytes_published: AtomicU64,
    bytes_consumed: AtomicU64,
    full_rejections: AtomicU64,
    empty_polls: AtomicU64,
    drains: AtomicU64,
    resets: AtomicU64,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub bytes_published: u64,
    pub bytes_consumed: u64,
    pub full_rejections: u64,
    pub empty_polls: u64,
    /// Times the consumer caught up and cleared the ack bit.
    pub drains: u64,
    /// Successful reconfigurations and forced resets.
    pub resets: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_bytes_published(&self, n: u64) {
        self.bytes_published.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_bytes_consumed(&self, n: u64) {
        self.bytes_consumed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_full_rejection(&self) {
        self.full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_empty_poll(&self) {
        self.empty_polls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_drain(&self) {
        self.drains.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
            bytes_consumed: self.bytes_consumed.load(Ordering::Relaxed),
            full_rejections: self.full_rejections.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}
