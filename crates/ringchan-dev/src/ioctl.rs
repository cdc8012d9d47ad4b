//! ioctl request codes, encoded the way Linux `_IOW`/`_IOR` do.

use crate::DeviceError;

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const fn ioc(dir: u32, ty: u8, nr: u8, size: u32) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | (size << IOC_SIZESHIFT)
}

/// Magic byte shared by the channel's requests.
pub const IOC_MAGIC: u8 = b'i';

/// `_IOW('i', 1, int)`: set the active buffer size.
pub const SET_BUFFER_SIZE: u32 = ioc(IOC_WRITE, IOC_MAGIC, 1, 4);

/// `_IOR('i', 2, int)`: read the active buffer size.
pub const GET_BUFFER_SIZE: u32 = ioc(IOC_READ, IOC_MAGIC, 2, 4);

/// A decoded ioctl request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetBufferSize(u32),
    GetBufferSize,
}

impl Command {
    /// Decodes a raw request code and its argument.
    pub fn decode(code: u32, arg: u32) -> Result<Self, DeviceError> {
        match code {
            SET_BUFFER_SIZE => Ok(Self::SetBufferSize(arg)),
            GET_BUFFER_SIZE => Ok(Self::GetBufferSize),
            other => Err(DeviceError::UnknownCommand(other)),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::SetBufferSize(_) => SET_BUFFER_SIZE,
            Self::GetBufferSize => GET_BUFFER_SIZE,
        }
    }
}
