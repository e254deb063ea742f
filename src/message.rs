//! Link message exchanged with the pump.
//!
//! Layout (1 byte):
//! ```text
//! Byte 0: 0x00 = discovery probe (pump just has to acknowledge)
//!         0x01 = pedal toggle    (pump flips its actuator)
//! ```
//!
//! No versioning, sequence number or checksum; ESP-NOW framing covers
//! integrity.

/// Encoded message size in bytes.
pub const MESSAGE_SIZE: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    /// `false` for a discovery probe, `true` for a pedal toggle.
    pub is_pedal_event: bool,
}

impl Message {
    pub const fn probe() -> Self {
        Self {
            is_pedal_event: false,
        }
    }

    pub const fn pedal_toggle() -> Self {
        Self {
            is_pedal_event: true,
        }
    }

    pub const fn encode(&self) -> [u8; MESSAGE_SIZE] {
        [self.is_pedal_event as u8]
    }

    /// Parse a received frame. Any non-zero first byte is a toggle;
    /// trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> Option<Self> {
        data.first().map(|&b| Self {
            is_pedal_event: b != 0,
        })
    }
}
