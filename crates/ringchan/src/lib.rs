//! ringchan - Shared-Memory Single-Producer Single-Consumer Byte Channel
//!
//! A host producer and a device consumer share one fixed-layout register
//! file: seven 32-bit registers followed by a circular payload buffer. The
//! host appends bytes and advances `producer_position`; the consumer reads
//! one byte at a time, publishes `consumer_position` after every read, and
//! clears the ack bit once it has caught up.
//!
//! # Key Features
//!
//! - Typed [`RegisterMap`] over any [`Region`] (heap, or `mmap` behind the feature)
//! - Acquire/Release ordering on every register, no locks
//! - Single-slot-reserved discipline: usable capacity is `configured_size - 1`
//! - "No data" is `Ok(None)`, never an error
//!
//! # Example
//!
//! ```
//! use ringchan::{ChannelConfig, HeapRegion, Producer, RingChannel};
//! use std::sync::Arc;
//!
//! let config = ChannelConfig::with_capacity(4);
//! let region = Arc::new(HeapRegion::for_config(&config));
//!
//! let mut channel = RingChannel::establish(Arc::clone(&region), config).unwrap();
//! let mut producer = Producer::attach(region).unwrap();
//!
//! producer.publish_byte(b'A').unwrap();
//! producer.publish_byte(b'B').unwrap();
//! assert!(channel.is_ack_pending());
//!
//! assert_eq!(channel.consume_one().unwrap(), Some(b'A'));
//! assert_eq!(channel.consume_one().unwrap(), Some(b'B'));
//! assert!(!channel.is_ack_pending());
//! assert_eq!(channel.consume_one().unwrap(), None);
//! ```

mod backoff;
mod channel;
mod config;
mod error;
mod invariants;
pub mod layout;
mod metrics;
mod producer;
mod region;
mod registers;
mod status;

pub use backoff::{poll_until, Backoff};
pub use channel::RingChannel;
pub use config::{ChannelConfig, BULK_CONFIG, SMALL_CONFIG};
pub use error::ChannelError;
pub use layout::{Field, ACK_NEW_DATA};
pub use metrics::{Metrics, MetricsSnapshot};
pub use producer::Producer;
pub use region::{HeapRegion, Region};
#[cfg(all(unix, feature = "mmap"))]
pub use region::{MappingError, MmapRegion};
pub use registers::RegisterMap;
pub use status::ChannelStatus;
