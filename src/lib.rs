//! Link logic for the pedal unit.
//!
//! Everything here is hardware-independent so it can be tested on the
//! host (no ESP32 required): the presence tracker, the discovery loop,
//! the event dispatcher, the controller that owns them, the pedal
//! debouncer and the ESP-NOW status-code classification.
//!
//! Usage: `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and plugs the ESP-NOW radio, the OLED and the pedal pin into the
//! traits defined here.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod config;
pub mod controller;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod input;
pub mod message;
pub mod peer;
pub mod presence;
pub mod status;
pub mod transport;

#[cfg(test)]
mod testing;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use controller::Controller;
pub use discovery::{DiscoveryLoop, DiscoveryStep};
pub use dispatcher::{Dispatch, Edge, EventDispatcher, PedalState};
pub use error::Error;
pub use input::{DebouncedPin, Debouncer, EdgeSource, Level};
pub use message::Message;
pub use peer::PeerAddress;
pub use presence::{PresenceBelief, PresenceTracker};
pub use status::{StatusPresenter, StatusView};
pub use transport::{
    await_delivery, classify, DeliveryOutcome, DeliveryReport, DeliverySignal, InFlight, Transport,
    TransportError,
};
