//! Presence tracker - this unit's opinion of whether the pump is reachable.
//!
//! The belief is a plain overwrite of the latest observation, never a
//! filtered signal: it may flap from one message to the next.

use crate::peer::PeerAddress;
use crate::transport::{DeliveryOutcome, DeliverySignal};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PresenceBelief {
    #[default]
    Unavailable,
    Present,
}

#[derive(Debug)]
pub struct PresenceTracker {
    belief: PresenceBelief,
}

impl PresenceTracker {
    pub const fn new() -> Self {
        Self {
            belief: PresenceBelief::Unavailable,
        }
    }

    pub fn belief(&self) -> PresenceBelief {
        self.belief
    }

    pub fn is_present(&self) -> bool {
        self.belief == PresenceBelief::Present
    }

    /// Pessimistic reset, called immediately before every send.
    pub fn mark_attempting(&mut self) {
        self.belief = PresenceBelief::Unavailable;
    }

    /// Optimistic set once the transport has accepted a frame.
    pub fn mark_accepted(&mut self) {
        self.belief = PresenceBelief::Present;
    }

    pub fn on_delivery_outcome(&mut self, success: bool) {
        self.belief = if success {
            PresenceBelief::Present
        } else {
            PresenceBelief::Unavailable
        };
    }

    /// Apply the latest unread delivery report, if any.
    ///
    /// Returns the outcome that was applied. Reports for any address other
    /// than `peer` are dropped.
    pub fn apply_pending(
        &mut self,
        reports: &DeliverySignal,
        peer: &PeerAddress,
    ) -> Option<DeliveryOutcome> {
        let report = reports.try_take()?;
        if report.peer != *peer {
            warn!("Delivery report from unexpected peer {}", report.peer);
            return None;
        }

        if report.outcome.is_success() {
            info!("Delivery success");
        } else {
            warn!("Delivery fail");
        }
        self.on_delivery_outcome(report.outcome.is_success());
        Some(report.outcome)
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}
