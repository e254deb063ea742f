//! Event dispatcher - turns debounced pedal edges into link traffic.
//!
//! A press sends exactly one toggle to the pump; a release only updates
//! local state. Nothing is queued or retried: a rejected press is logged
//! and left behind.

use crate::input::Level;
use crate::message::Message;
use crate::peer::PeerAddress;
use crate::presence::PresenceTracker;
use crate::transport::{log_result, Operation, Transport, TransportError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Press,
    Release,
}

impl Edge {
    /// The switch reads HIGH while pressed.
    pub const fn from_level(level: Level) -> Self {
        match level {
            Level::High => Edge::Press,
            Level::Low => Edge::Release,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PedalState {
    #[default]
    Up,
    Down,
}

/// What handling one edge did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dispatch {
    pub edge: Edge,
    /// Transport result for a press, `None` for a release.
    pub send: Option<Result<(), TransportError>>,
    /// Release count after handling the edge.
    pub press_count: u32,
}

#[derive(Debug, Default)]
pub struct EventDispatcher {
    pedal: PedalState,
    press_count: u32,
}

impl EventDispatcher {
    pub const fn new() -> Self {
        Self {
            pedal: PedalState::Up,
            press_count: 0,
        }
    }

    pub fn pedal(&self) -> PedalState {
        self.pedal
    }

    /// Completed press/release cycles (diagnostic only).
    pub fn press_count(&self) -> u32 {
        self.press_count
    }

    pub async fn dispatch<T: Transport>(
        &mut self,
        edge: Edge,
        transport: &mut T,
        presence: &mut PresenceTracker,
        peer: &PeerAddress,
    ) -> Dispatch {
        let send = match edge {
            Edge::Press => {
                self.pedal = PedalState::Down;
                let result = self.send_toggle(transport, presence, peer).await;
                info!("Pedal press {}", self.press_count);
                Some(result)
            }
            Edge::Release => {
                self.pedal = PedalState::Up;
                info!("Pedal release {}", self.press_count);
                self.press_count = self.press_count.saturating_add(1);
                None
            }
        };

        Dispatch {
            edge,
            send,
            press_count: self.press_count,
        }
    }

    async fn send_toggle<T: Transport>(
        &mut self,
        transport: &mut T,
        presence: &mut PresenceTracker,
        peer: &PeerAddress,
    ) -> Result<(), TransportError> {
        presence.mark_attempting();
        let result = transport.send(peer, Message::pedal_toggle()).await;
        log_result(Operation::PedalEvent, &result);
        if result.is_ok() {
            presence.mark_accepted();
        }
        result
    }
}
