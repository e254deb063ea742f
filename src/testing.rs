//! Host-side test doubles shared by the unit tests.

use std::collections::VecDeque;

use embedded_hal_async::delay::DelayNs;

use crate::input::{EdgeSource, Level};
use crate::message::Message;
use crate::peer::PeerAddress;
use crate::status::{StatusPresenter, StatusView};
use crate::transport::{
    DeliveryOutcome, DeliveryReport, DeliverySignal, Transport, TransportError,
};

pub const PUMP: PeerAddress = PeerAddress::new([0x84, 0xCC, 0xA8, 0x2C, 0x0D, 0xA8]);

/// Transport whose every answer is scripted up front.
pub struct ScriptedTransport {
    pub init_result: Result<(), TransportError>,
    pub callback_result: Result<(), TransportError>,
    pub peer_result: Result<(), TransportError>,
    /// Consumed front to back; `fallback` answers once it is empty.
    pub script: VecDeque<Result<(), TransportError>>,
    pub fallback: Result<(), TransportError>,
    pub sent: Vec<(PeerAddress, Message)>,
    pub registered: Vec<PeerAddress>,
    pub reports: Option<&'static DeliverySignal>,
}

impl ScriptedTransport {
    pub fn accepting() -> Self {
        Self {
            init_result: Ok(()),
            callback_result: Ok(()),
            peer_result: Ok(()),
            script: VecDeque::new(),
            fallback: Ok(()),
            sent: Vec::new(),
            registered: Vec::new(),
            reports: None,
        }
    }

    pub fn rejecting(error: TransportError) -> Self {
        Self {
            fallback: Err(error),
            ..Self::accepting()
        }
    }

    /// Answer the next sends with `results` before falling back.
    pub fn then(mut self, results: &[Result<(), TransportError>]) -> Self {
        self.script.extend(results.iter().copied());
        self
    }

    /// Fire the delivery callback as the radio would.
    pub fn deliver(&self, outcome: DeliveryOutcome) {
        if let Some(reports) = self.reports {
            reports.signal(DeliveryReport {
                peer: PUMP,
                outcome,
            });
        }
    }

    pub fn pedal_events(&self) -> usize {
        self.sent.iter().filter(|(_, m)| m.is_pedal_event).count()
    }
}

impl Transport for ScriptedTransport {
    async fn init(&mut self) -> Result<(), TransportError> {
        self.init_result
    }

    fn register_delivery_callback(
        &mut self,
        reports: &'static DeliverySignal,
    ) -> Result<(), TransportError> {
        self.reports = Some(reports);
        self.callback_result
    }

    async fn register_peer(&mut self, peer: &PeerAddress) -> Result<(), TransportError> {
        self.registered.push(*peer);
        self.peer_result
    }

    async fn send(&mut self, peer: &PeerAddress, message: Message) -> Result<(), TransportError> {
        self.sent.push((*peer, message));
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

/// Delay that returns at once and records what it was asked to wait.
#[derive(Default)]
pub struct VirtualDelay {
    pub pauses: Vec<u32>,
}

impl DelayNs for VirtualDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.pauses.push(ns / 1_000_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.pauses.push(us / 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.pauses.push(ms);
    }
}

/// Presenter that keeps every frame it was asked to draw.
#[derive(Default)]
pub struct RecordingPresenter {
    pub frames: Vec<StatusView>,
}

impl StatusPresenter for RecordingPresenter {
    fn render(&mut self, pedal_down: bool, peer_present: bool) {
        self.frames.push(StatusView {
            pedal_down,
            peer_present,
        });
    }
}

/// Edge source fed one debounced level per poll; `None` means "no change".
pub struct ScriptedInput {
    script: VecDeque<Option<Level>>,
    level: Level,
    changed: bool,
}

impl ScriptedInput {
    pub fn new(script: &[Option<Level>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            level: Level::Low,
            changed: false,
        }
    }
}

impl EdgeSource for ScriptedInput {
    fn poll(&mut self) {
        self.changed = false;
        if let Some(Some(level)) = self.script.pop_front() {
            self.changed = level != self.level;
            self.level = level;
        }
    }

    fn changed(&self) -> bool {
        self.changed
    }

    fn level(&self) -> Level {
        self.level
    }
}
