//! Radio link subsystem - ESP-NOW transport for the pedal unit.
//!
//! The controller talks to [`EspNowTransport`] through the
//! [`pedal_link::Transport`] trait. The transport owns the ESP-NOW peer
//! manager; frames go out from a dedicated link task that owns the
//! sender, so the controller only waits for the radio to accept a frame
//! and never for the peer's acknowledgement.
//!
//! ## Flow
//!
//! ```text
//! Controller ──send()──► OUTBOUND channel ──► link_task ──► esp_now_send
//!      ▲                                          │
//!      └──────── ACCEPTED signal ◄────────────────┤ (synchronous status)
//!                                                 │
//!   DeliverySignal ◄──────────────────────────────┘ (ack / no ack)
//! ```

pub mod esp_now;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::once_lock::OnceLock;
use embassy_sync::signal::Signal;
use pedal_link::{DeliverySignal, Message, PeerAddress, TransportError};

pub use self::esp_now::EspNowTransport;

/// One frame handed to the link task.
#[derive(Clone, Copy, defmt::Format)]
pub struct Outbound {
    pub peer: PeerAddress,
    pub message: Message,
}

/// Frames waiting for the link task. Depth 1: the controller waits for
/// each frame to be accepted before queueing the next.
pub static OUTBOUND: Channel<CriticalSectionRawMutex, Outbound, 1> = Channel::new();

/// Synchronous status of the frame most recently taken from [`OUTBOUND`].
pub static ACCEPTED: Signal<CriticalSectionRawMutex, Result<(), TransportError>> = Signal::new();

/// Where the link task publishes delivery reports. Set once by
/// `register_delivery_callback`; reports are dropped until then.
pub static DELIVERY_SINK: OnceLock<&'static DeliverySignal> = OnceLock::new();
