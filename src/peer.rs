//! Physical-layer address of the single remote peer (the pump unit).

use core::fmt;
use core::fmt::Write;

use heapless::String;

/// Length of an ESP-NOW (802.11 MAC) address.
pub const PEER_ADDRESS_LEN: usize = 6;

/// Length of the `AA:BB:CC:DD:EE:FF` text form.
pub const PEER_LABEL_LEN: usize = 17;

/// Fixed MAC address of the peer. Set at build time, never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress([u8; PEER_ADDRESS_LEN]);

impl PeerAddress {
    pub const fn new(octets: [u8; PEER_ADDRESS_LEN]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> &[u8; PEER_ADDRESS_LEN] {
        &self.0
    }

    /// True when the group bit of the first octet is clear.
    ///
    /// ESP-NOW only acknowledges unicast frames, so a multicast or
    /// broadcast address never produces a successful delivery report.
    pub const fn is_unicast(&self) -> bool {
        self.0[0] & 0x01 == 0
    }

    /// Render as upper-case colon-separated hex for the OLED.
    pub fn label(&self) -> String<PEER_LABEL_LEN> {
        let mut out = String::new();
        // 17 bytes always fit.
        let _ = write!(out, "{}", self);
        out
    }
}

impl From<[u8; PEER_ADDRESS_LEN]> for PeerAddress {
    fn from(octets: [u8; PEER_ADDRESS_LEN]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(':')?;
            }
            write!(f, "{:02X}", octet)?;
        }
        Ok(())
    }
}
