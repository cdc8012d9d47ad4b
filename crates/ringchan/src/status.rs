use crate::layout::{Field, ACK_NEW_DATA};
use crate::{Region, RegisterMap};
use std::fmt;

/// Register snapshot exposed to the administrative interface.
///
/// Fields are read one at a time, so a snapshot taken while the other side
/// is active may mix values from before and after a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    pub ack: u32,
    pub producer_position: u32,
    pub consumer_position: u32,
    pub capacity: u32,
    pub configured_size: u32,
    pub status_word: u32,
}

impl ChannelStatus {
    pub fn capture<R: Region>(regs: &RegisterMap<R>) -> Self {
        Self {
            ack: regs.get(Field::Ack),
            producer_position: regs.get(Field::ProducerPosition),
            consumer_position: regs.get(Field::ConsumerPosition),
            capacity: regs.get(Field::Capacity),
            configured_size: regs.get(Field::ConfiguredSize),
            status_word: regs.get(Field::Status),
        }
    }

    #[inline]
    pub fn new_data(&self) -> bool {
        self.ack & ACK_NEW_DATA != 0
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.consumer_position == self.producer_position && !self.new_data()
    }
}

/// Renders the `status` attribute:
///
/// ```text
/// ack: 0x00000001
/// new_data: yes
/// buffer_pos: 2
/// read_pos: 1
/// max_size: 30720
/// ```
impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ack: {:#010x}", self.ack)?;
        writeln!(f, "new_data: {}", if self.new_data() { "yes" } else { "no" })?;
        writeln!(f, "buffer_pos: {}", self.producer_position)?;
        writeln!(f, "read_pos: {}", self.consumer_position)?;
        writeln!(f, "max_size: {}", self.capacity)
    }
}
