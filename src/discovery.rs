//! Discovery loop - probe the pump until the radio takes a probe.
//!
//! The loop exits as soon as the transport *accepts* a probe. It does not
//! wait for the delivery report, so it can finish before the pump has
//! actually answered; the report lands in the presence tracker later.
//! There is no retry limit and no backoff: every rejection, whatever its
//! kind, is followed by the same fixed pause.

use embedded_hal_async::delay::DelayNs;

use crate::message::Message;
use crate::peer::PeerAddress;
use crate::presence::PresenceTracker;
use crate::transport::{log_result, Operation, Transport, TransportError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoveryStep {
    /// The transport accepted the probe; presence is now `Present`.
    Found,
    /// The transport refused the probe.
    Rejected(TransportError),
}

#[derive(Debug)]
pub struct DiscoveryLoop {
    retry_ms: u32,
    attempts: u32,
}

impl DiscoveryLoop {
    pub const fn new(retry_ms: u32) -> Self {
        Self {
            retry_ms,
            attempts: 0,
        }
    }

    /// Probes sent so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// One probe, no pause.
    pub async fn attempt<T: Transport>(
        &mut self,
        transport: &mut T,
        presence: &mut PresenceTracker,
        peer: &PeerAddress,
    ) -> DiscoveryStep {
        self.attempts = self.attempts.saturating_add(1);

        presence.mark_attempting();
        let result = transport.send(peer, Message::probe()).await;
        log_result(Operation::Probe, &result);

        match result {
            Ok(()) => {
                presence.mark_accepted();
                DiscoveryStep::Found
            }
            Err(e) => DiscoveryStep::Rejected(e),
        }
    }

    /// Probe until one is accepted. Returns the number of probes sent.
    pub async fn run<T: Transport, D: DelayNs>(
        &mut self,
        transport: &mut T,
        presence: &mut PresenceTracker,
        peer: &PeerAddress,
        delay: &mut D,
    ) -> u32 {
        info!("Looking for pump {}", peer);

        loop {
            match self.attempt(transport, presence, peer).await {
                DiscoveryStep::Found => {
                    info!("Pump probe accepted after {} attempt(s)", self.attempts);
                    return self.attempts;
                }
                DiscoveryStep::Rejected(_) => {
                    delay.delay_ms(self.retry_ms).await;
                }
            }
        }
    }
}
