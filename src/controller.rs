//! Controller - owns all link state for the lifetime of the firmware.
//!
//! Boot sequence ([`Controller::start`]):
//!
//! 1. bring the transport up (the only fatal step),
//! 2. register the delivery callback and the pump as a peer (logged only),
//! 3. draw the initial panel,
//! 4. run discovery until a probe is accepted,
//! 5. draw the panel again.
//!
//! After that the caller drives [`Controller::service`] once per main-loop
//! iteration. Delivery reports are drained there without ever waiting for
//! one, so a send is followed immediately by the next iteration.

use embedded_hal_async::delay::DelayNs;

use crate::discovery::DiscoveryLoop;
use crate::dispatcher::{Dispatch, Edge, EventDispatcher, PedalState};
use crate::error::Error;
use crate::input::EdgeSource;
use crate::peer::PeerAddress;
use crate::presence::{PresenceBelief, PresenceTracker};
use crate::status::{StatusPresenter, StatusView};
use crate::transport::{log_result, DeliveryOutcome, DeliverySignal, Operation, Transport};

pub struct Controller<T> {
    transport: T,
    peer: PeerAddress,
    reports: &'static DeliverySignal,
    presence: PresenceTracker,
    dispatcher: EventDispatcher,
    discovery: DiscoveryLoop,
}

impl<T: Transport> Controller<T> {
    pub fn new(transport: T, peer: PeerAddress, reports: &'static DeliverySignal) -> Self {
        Self {
            transport,
            peer,
            reports,
            presence: PresenceTracker::new(),
            dispatcher: EventDispatcher::new(),
            discovery: DiscoveryLoop::new(crate::config::DISCOVERY_RETRY_MS),
        }
    }

    /// Override the pause between rejected probes.
    pub fn with_retry_ms(mut self, retry_ms: u32) -> Self {
        self.discovery = DiscoveryLoop::new(retry_ms);
        self
    }

    /// Boot the link. Returns the number of discovery probes sent.
    ///
    /// An `Err` means the transport could not be initialised; the caller
    /// is expected to restart the device.
    pub async fn start<D: DelayNs, P: StatusPresenter>(
        &mut self,
        delay: &mut D,
        presenter: &mut P,
    ) -> Result<u32, Error> {
        let result = self.transport.init().await;
        log_result(Operation::Init, &result);
        if let Err(e) = result {
            error!("Transport init failed: {}", e.describe());
            return Err(e.into());
        }

        let result = self.transport.register_delivery_callback(self.reports);
        log_result(Operation::RegisterCallback, &result);

        if !self.peer.is_unicast() {
            warn!("Pump address {} is not unicast; deliveries will fail", self.peer);
        }
        let result = self.transport.register_peer(&self.peer).await;
        log_result(Operation::RegisterPeer, &result);

        self.render(presenter);

        let attempts = self
            .discovery
            .run(&mut self.transport, &mut self.presence, &self.peer, delay)
            .await;

        self.render(presenter);
        Ok(attempts)
    }

    /// One main-loop iteration: sample the pedal, fold in the latest
    /// delivery report, and handle an edge if there is one.
    pub async fn service<I: EdgeSource, P: StatusPresenter>(
        &mut self,
        input: &mut I,
        presenter: &mut P,
    ) -> Option<Dispatch> {
        input.poll();
        self.refresh_presence();

        if !input.changed() {
            return None;
        }

        let edge = Edge::from_level(input.level());
        let dispatch = self
            .dispatcher
            .dispatch(edge, &mut self.transport, &mut self.presence, &self.peer)
            .await;

        self.render(presenter);
        Some(dispatch)
    }

    /// Drive [`service`](Self::service) forever, pausing `poll_ms` between
    /// iterations.
    pub async fn run<I: EdgeSource, P: StatusPresenter, D: DelayNs>(
        &mut self,
        input: &mut I,
        presenter: &mut P,
        delay: &mut D,
        poll_ms: u32,
    ) -> ! {
        info!("Pedal loop running");
        loop {
            self.service(input, presenter).await;
            delay.delay_ms(poll_ms).await;
        }
    }

    /// Apply the latest delivery report, if one arrived.
    pub fn refresh_presence(&mut self) -> Option<DeliveryOutcome> {
        self.presence.apply_pending(self.reports, &self.peer)
    }

    pub fn status(&self) -> StatusView {
        StatusView {
            pedal_down: self.dispatcher.pedal() == PedalState::Down,
            peer_present: self.presence.is_present(),
        }
    }

    pub fn presence(&self) -> PresenceBelief {
        self.presence.belief()
    }

    pub fn pedal(&self) -> PedalState {
        self.dispatcher.pedal()
    }

    pub fn press_count(&self) -> u32 {
        self.dispatcher.press_count()
    }

    pub fn peer(&self) -> &PeerAddress {
        &self.peer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn render<P: StatusPresenter>(&self, presenter: &mut P) {
        let view = self.status();
        presenter.render(view.pedal_down, view.peer_present);
    }
}
