use crate::attributes::parse_u32;
use crate::{Attribute, Command, DeviceError};
use ringchan::{poll_until, ChannelConfig, ChannelStatus, Region, RingChannel};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Consumer-side device wrapping one channel.
///
/// Mirrors a character device: [`open`](Self::open) hands out [`Handle`]s
/// whose `read`/`ioctl` calls go through the channel, and named attributes
/// expose status and the buffer-size knob. The mutex serializes readers
/// inside this process only; the producer on the other side of the region
/// never takes it.
pub struct Device<R: Region> {
    channel: Mutex<RingChannel<R>>,
}

impl<R: Region> Device<R> {
    /// Establishes a fresh channel in `region` (the probe sequence).
    pub fn probe(region: R, config: ChannelConfig) -> Result<Self, DeviceError> {
        let channel = RingChannel::establish(region, config)?;
        log::info!("device ready, status:\n{}", channel.status());
        Ok(Self {
            channel: Mutex::new(channel),
        })
    }

    /// Wraps a region whose channel was established earlier.
    pub fn attach(region: R) -> Result<Self, DeviceError> {
        let channel = RingChannel::attach(region)?;
        Ok(Self {
            channel: Mutex::new(channel),
        })
    }

    fn channel(&self) -> MutexGuard<'_, RingChannel<R>> {
        // Channel state lives in the region, not behind the lock; a panicked
        // reader leaves nothing half-updated here.
        self.channel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the device, recording the producer position seen at open.
    pub fn open(&self) -> Handle<'_, R> {
        let mut channel = self.channel();
        let opened_at = channel.observe_producer();
        log::info!(
            "device opened, read_pos={}, buffer_pos={}",
            channel.consumer_position(),
            opened_at
        );
        Handle {
            device: self,
            opened_at,
        }
    }

    pub fn status(&self) -> ChannelStatus {
        self.channel().status()
    }

    /// Renders an attribute the way its file would read.
    pub fn show(&self, attr: Attribute) -> String {
        let channel = self.channel();
        match attr {
            Attribute::BufferSize => format!("{}\n", channel.configured_size()),
            Attribute::MaxBufferSize => format!("{}\n", channel.capacity()),
            Attribute::Status => channel.status().to_string(),
        }
    }

    /// Writes an attribute. Returns the number of input bytes consumed.
    ///
    /// `buffer_size` goes through [`RingChannel::reconfigure`], so it is
    /// rejected while bytes are pending.
    pub fn store(&self, attr: Attribute, input: &str) -> Result<usize, DeviceError> {
        if !attr.is_writable() {
            return Err(DeviceError::ReadOnly(attr.name()));
        }
        let size = parse_u32(input)?;
        self.channel().reconfigure(size)?;
        Ok(input.len())
    }

    /// [`show`](Self::show) by attribute name.
    pub fn show_named(&self, name: &str) -> Result<String, DeviceError> {
        Ok(self.show(name.parse()?))
    }

    /// [`store`](Self::store) by attribute name.
    pub fn store_named(&self, name: &str, input: &str) -> Result<usize, DeviceError> {
        self.store(name.parse()?, input)
    }

    /// Discards pending data and sets a new size (administrative hard reset).
    pub fn force_reset(&self, size: u32) -> Result<(), DeviceError> {
        self.channel().force_reset(size)?;
        Ok(())
    }

    /// Tears the device down, returning the region for unmapping.
    pub fn remove(self) -> R {
        log::info!("removing device");
        self.channel
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_region()
    }
}

impl<R: Region> std::fmt::Debug for Device<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("status", &self.status())
            .finish()
    }
}

/// An open file on a [`Device`].
pub struct Handle<'a, R: Region> {
    device: &'a Device<R>,
    opened_at: u32,
}

impl<R: Region> Handle<'_, R> {
    /// Producer position observed when this handle was opened.
    #[inline]
    pub fn opened_at(&self) -> u32 {
        self.opened_at
    }

    /// Reads whatever is pending, up to `buf.len()` bytes. Returns 0 when
    /// nothing is available or `buf` is empty; never blocks.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.device.channel().drain_into(buf)?;
        if n == 0 {
            log::trace!("read: no new data");
        }
        Ok(n)
    }

    /// Like [`read`](Self::read) but polls until at least one byte arrives
    /// or `timeout` elapses (then returns 0).
    pub fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, DeviceError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = poll_until(timeout, || {
            let n = self.read(buf)?;
            Ok::<_, DeviceError>((n > 0).then_some(n))
        })?;
        Ok(n.unwrap_or(0))
    }

    /// Accepts and discards `buf`; the consumer side is read-only.
    pub fn write(&self, buf: &[u8]) -> usize {
        buf.len()
    }

    /// Executes a decoded request. `GetBufferSize` returns the size; other
    /// commands return 0.
    pub fn command(&self, cmd: Command) -> Result<u32, DeviceError> {
        let mut channel = self.device.channel();
        match cmd {
            Command::SetBufferSize(size) => {
                channel.reconfigure(size)?;
                Ok(0)
            }
            Command::GetBufferSize => Ok(channel.configured_size()),
        }
    }

    /// Raw ioctl entry: `arg` is read for set requests and written for get
    /// requests.
    pub fn ioctl(&self, code: u32, arg: &mut u32) -> Result<(), DeviceError> {
        let cmd = Command::decode(code, *arg)?;
        let out = self.command(cmd)?;
        if cmd == Command::GetBufferSize {
            *arg = out;
        }
        Ok(())
    }
}

impl<R: Region> Drop for Handle<'_, R> {
    fn drop(&mut self) {
        log::info!("device closed");
    }
}
