//! Device shell for ringchan
//!
//! Presents a [`ringchan::RingChannel`] the way the consumer-side driver did:
//! a device that is probed on a shared region, opened into handles that
//! `read` and `ioctl`, and a set of named attributes (`buffer_size`,
//! `max_buffer_size`, `status`) for administration.
//!
//! # Example
//!
//! ```
//! use ringchan::{ChannelConfig, HeapRegion, Producer};
//! use ringchan_dev::{Attribute, Device};
//! use std::sync::Arc;
//!
//! let config = ChannelConfig::with_capacity(64);
//! let region = Arc::new(HeapRegion::for_config(&config));
//! let device = Device::probe(Arc::clone(&region), config).unwrap();
//! let mut host = Producer::attach(region).unwrap();
//!
//! host.publish(b"hi").unwrap();
//! let handle = device.open();
//! let mut buf = [0u8; 8];
//! assert_eq!(handle.read(&mut buf).unwrap(), 2);
//! assert_eq!(&buf[..2], b"hi");
//!
//! assert_eq!(device.show(Attribute::MaxBufferSize), "64\n");
//! device.store(Attribute::BufferSize, "0x20\n").unwrap();
//! assert_eq!(device.show(Attribute::BufferSize), "32\n");
//! ```

mod attributes;
mod device;
mod error;
pub mod ioctl;

pub use attributes::{parse_u32, Attribute};
pub use device::{Device, Handle};
pub use error::DeviceError;
pub use ioctl::Command;
