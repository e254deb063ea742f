//! Integration tests for pedal-link host-testable logic.
//!
//! Time is virtual: the stub delay advances a shared clock and yields, so
//! the "infinite" discovery loop can be raced against a deadline with
//! `select` and every test finishes instantly.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_futures::select::{select, Either};
use embassy_futures::{block_on, yield_now};
use embedded_hal_async::delay::DelayNs;

use pedal_link::{
    Controller, DeliveryOutcome, DeliveryReport, DeliverySignal, DiscoveryLoop, EdgeSource, Level,
    Message, PeerAddress, PresenceBelief, PresenceTracker, StatusPresenter, StatusView, Transport,
    TransportError,
};

const PUMP: PeerAddress = PeerAddress::new([0x84, 0xCC, 0xA8, 0x2C, 0x0D, 0xA8]);
const RETRY_MS: u32 = 1000;

type Clock = Rc<Cell<u64>>;

// ═══════════════════════════════════════════════════════════════════════════
// Stubs
// ═══════════════════════════════════════════════════════════════════════════

/// ESP-NOW stand-in. Scripted results win; otherwise it rejects with
/// `reject_with` until the clock reaches `accept_from_ms`.
struct LinkStub {
    clock: Clock,
    accept_from_ms: u64,
    reject_with: TransportError,
    script: VecDeque<Result<(), TransportError>>,
    sends: Vec<(Message, u64)>,
    reports: Option<&'static DeliverySignal>,
    in_flight: u32,
}

impl LinkStub {
    fn new(clock: Clock) -> Self {
        Self {
            clock,
            accept_from_ms: 0,
            reject_with: TransportError::PeerNotFound,
            script: VecDeque::new(),
            sends: Vec::new(),
            reports: None,
            in_flight: 0,
        }
    }

    fn rejecting_until(clock: Clock, accept_from_ms: u64, reject_with: TransportError) -> Self {
        Self {
            accept_from_ms,
            reject_with,
            ..Self::new(clock)
        }
    }

    fn never_accepting(clock: Clock, reject_with: TransportError) -> Self {
        Self::rejecting_until(clock, u64::MAX, reject_with)
    }

    fn push(&mut self, result: Result<(), TransportError>) {
        self.script.push_back(result);
    }

    /// Resolve the oldest accepted frame through the delivery callback.
    fn complete(&mut self, outcome: DeliveryOutcome) {
        assert!(self.in_flight > 0, "no frame in flight");
        self.in_flight -= 1;
        let reports = self.reports.expect("callback not registered");
        reports.signal(DeliveryReport {
            peer: PUMP,
            outcome,
        });
    }

    fn pedal_events(&self) -> usize {
        self.sends.iter().filter(|(m, _)| m.is_pedal_event).count()
    }

    fn probes(&self) -> usize {
        self.sends.iter().filter(|(m, _)| !m.is_pedal_event).count()
    }
}

impl Transport for LinkStub {
    async fn init(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn register_delivery_callback(
        &mut self,
        reports: &'static DeliverySignal,
    ) -> Result<(), TransportError> {
        self.reports = Some(reports);
        Ok(())
    }

    async fn register_peer(&mut self, _peer: &PeerAddress) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(&mut self, peer: &PeerAddress, message: Message) -> Result<(), TransportError> {
        assert_eq!(*peer, PUMP);
        let now = self.clock.get();
        // Record what the pump would read off the air.
        let received = Message::decode(&message.encode()).expect("empty frame on the wire");
        self.sends.push((received, now));

        let result = self.script.pop_front().unwrap_or(if now >= self.accept_from_ms {
            Ok(())
        } else {
            Err(self.reject_with)
        });
        if result.is_ok() {
            self.in_flight += 1;
        }
        result
    }
}

/// Advances the shared clock, then yields once so racing futures run.
struct ClockDelay(Clock);

impl DelayNs for ClockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.set(self.0.get() + u64::from(ns) / 1_000_000);
        yield_now().await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.set(self.0.get() + u64::from(ms));
        yield_now().await;
    }
}

#[derive(Default)]
struct Panel {
    frames: Vec<StatusView>,
}

impl StatusPresenter for Panel {
    fn render(&mut self, pedal_down: bool, peer_present: bool) {
        self.frames.push(StatusView {
            pedal_down,
            peer_present,
        });
    }
}

/// Debounced levels handed out one per poll; `None` means "no change".
struct Pedal {
    script: VecDeque<Option<Level>>,
    level: Level,
    changed: bool,
}

impl Pedal {
    fn new(script: &[Option<Level>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            level: Level::Low,
            changed: false,
        }
    }
}

impl EdgeSource for Pedal {
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

/// Boot a controller whose first probe is accepted.
fn booted(reports: &'static DeliverySignal) -> (Controller<LinkStub>, Panel) {
    let clock = Clock::default();
    let mut controller =
        Controller::new(LinkStub::new(clock.clone()), PUMP, reports).with_retry_ms(RETRY_MS);
    let mut panel = Panel::default();
    let attempts = block_on(controller.start(&mut ClockDelay(clock), &mut panel))
        .expect("transport init failed");
    assert_eq!(attempts, 1);
    // The probe itself never resolves in these scenarios.
    controller.transport_mut().in_flight = 0;
    panel.frames.clear();
    (controller, panel)
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn press_accepted_and_delivered_marks_pump_present() {
    static REPORTS: DeliverySignal = DeliverySignal::new();
    let (mut controller, mut panel) = booted(&REPORTS);
    let mut pedal = Pedal::new(&[Some(Level::High), None]);

    let dispatch = block_on(controller.service(&mut pedal, &mut panel)).expect("press edge");
    assert_eq!(dispatch.send, Some(Ok(())));

    controller.transport_mut().complete(DeliveryOutcome::Delivered);
    block_on(controller.service(&mut pedal, &mut panel));

    assert_eq!(controller.presence(), PresenceBelief::Present);
    assert_eq!(controller.transport().pedal_events(), 1);
    assert_eq!(
        controller.transport().sends.last().map(|(m, _)| *m),
        Some(Message { is_pedal_event: true })
    );
}

#[test]
fn press_rejected_leaves_pump_unavailable() {
    static REPORTS: DeliverySignal = DeliverySignal::new();
    let (mut controller, mut panel) = booted(&REPORTS);
    controller.transport_mut().push(Err(TransportError::PeerNotFound));
    let mut pedal = Pedal::new(&[Some(Level::High), None]);

    let dispatch = block_on(controller.service(&mut pedal, &mut panel)).expect("press edge");
    assert_eq!(dispatch.send, Some(Err(TransportError::PeerNotFound)));
    block_on(controller.service(&mut pedal, &mut panel));

    assert_eq!(controller.presence(), PresenceBelief::Unavailable);
    assert_eq!(controller.transport().in_flight, 0);
    assert_eq!(REPORTS.try_take(), None);
    assert_eq!(
        panel.frames,
        vec![StatusView {
            pedal_down: true,
            peer_present: false
        }]
    );
}

#[test]
fn release_after_delivered_press_sends_nothing() {
    static REPORTS: DeliverySignal = DeliverySignal::new();
    let (mut controller, mut panel) = booted(&REPORTS);
    let mut pedal = Pedal::new(&[Some(Level::High), Some(Level::Low)]);

    block_on(controller.service(&mut pedal, &mut panel));
    controller.transport_mut().complete(DeliveryOutcome::Delivered);
    let sends_before = controller.transport().sends.len();
    let count_before = controller.press_count();

    let dispatch = block_on(controller.service(&mut pedal, &mut panel)).expect("release edge");

    assert_eq!(dispatch.send, None);
    assert_eq!(controller.transport().sends.len(), sends_before);
    assert_eq!(controller.press_count(), count_before + 1);
    assert_eq!(
        panel.frames.last(),
        Some(&StatusView {
            pedal_down: false,
            peer_present: true
        })
    );
}

#[test]
fn discovery_retries_until_first_accept_then_main_loop_runs() {
    static REPORTS: DeliverySignal = DeliverySignal::new();
    let clock = Clock::default();
    let link = LinkStub::rejecting_until(clock.clone(), 2500, TransportError::PeerNotFound);
    let mut controller = Controller::new(link, PUMP, &REPORTS).with_retry_ms(RETRY_MS);
    let mut panel = Panel::default();

    let attempts = block_on(controller.start(&mut ClockDelay(clock.clone()), &mut panel))
        .expect("transport init failed");

    let sends = &controller.transport().sends;
    assert_eq!(attempts, 4);
    assert_eq!(
        sends.iter().map(|(_, t)| *t).collect::<Vec<_>>(),
        vec![0, 1000, 2000, 3000]
    );
    // Only the last probe was accepted, and discovery stopped right there.
    assert_eq!(clock.get(), 3000);
    assert_eq!(controller.presence(), PresenceBelief::Present);

    let mut pedal = Pedal::new(&[Some(Level::High)]);
    let dispatch = block_on(controller.service(&mut pedal, &mut panel)).expect("press edge");
    assert_eq!(dispatch.send, Some(Ok(())));
    assert_eq!(controller.transport().pedal_events(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn presence_tracks_most_recent_outcome_only() {
    static REPORTS: DeliverySignal = DeliverySignal::new();
    let (mut controller, mut panel) = booted(&REPORTS);

    // (send result, delivery outcome if accepted, expected belief)
    let steps = [
        (Ok(()), Some(DeliveryOutcome::Delivered), PresenceBelief::Present),
        (Ok(()), Some(DeliveryOutcome::Failed), PresenceBelief::Unavailable),
        (Ok(()), Some(DeliveryOutcome::Delivered), PresenceBelief::Present),
        (Err(TransportError::OutOfMemory), None, PresenceBelief::Unavailable),
        (Err(TransportError::InternalError), None, PresenceBelief::Unavailable),
        (Ok(()), Some(DeliveryOutcome::Delivered), PresenceBelief::Present),
        (Err(TransportError::Unknown(-1)), None, PresenceBelief::Unavailable),
        (Ok(()), None, PresenceBelief::Present),
        (Ok(()), Some(DeliveryOutcome::Failed), PresenceBelief::Unavailable),
    ];

    for (result, outcome, expected) in steps {
        controller.transport_mut().push(result);
        let mut pedal = Pedal::new(&[Some(Level::High), Some(Level::Low), None]);
        block_on(controller.service(&mut pedal, &mut panel));
        if let Some(outcome) = outcome {
            controller.transport_mut().complete(outcome);
        }
        block_on(controller.service(&mut pedal, &mut panel));
        block_on(controller.service(&mut pedal, &mut panel));
        assert_eq!(controller.presence(), expected, "after {:?} / {:?}", result, outcome);
    }
}

#[test]
fn one_toggle_per_press_edge() {
    static REPORTS: DeliverySignal = DeliverySignal::new();
    let (mut controller, mut panel) = booted(&REPORTS);
    controller.transport_mut().push(Err(TransportError::PeerNotFound));

    let script = [
        Some(Level::High),
        None,
        Some(Level::Low),
        Some(Level::High),
        Some(Level::Low),
        None,
        None,
        Some(Level::High),
        Some(Level::Low),
        Some(Level::High),
        Some(Level::Low),
        Some(Level::High),
    ];
    let presses = script.iter().filter(|l| **l == Some(Level::High)).count();
    let releases = script.iter().filter(|l| **l == Some(Level::Low)).count();
    let mut pedal = Pedal::new(&script);

    for _ in 0..script.len() {
        block_on(controller.service(&mut pedal, &mut panel));
    }

    assert_eq!(controller.transport().pedal_events(), presses);
    assert_eq!(controller.press_count() as usize, releases);
    // Only the boot probe besides the toggles.
    assert_eq!(controller.transport().probes(), 1);
}

#[test]
fn discovery_exits_on_accept_without_confirmation() {
    static REPORTS: DeliverySignal = DeliverySignal::new();
    let clock = Clock::default();
    let mut link = LinkStub::new(clock.clone());
    link.register_delivery_callback(&REPORTS).unwrap();
    let mut presence = PresenceTracker::new();
    let mut discovery = DiscoveryLoop::new(RETRY_MS);

    let attempts = block_on(discovery.run(&mut link, &mut presence, &PUMP, &mut ClockDelay(clock)));

    assert_eq!(attempts, 1);
    assert!(presence.is_present());
    // Accepted but never confirmed.
    assert_eq!(link.in_flight, 1);
    assert_eq!(REPORTS.try_take(), None);
}

#[test]
fn discovery_never_gives_up_on_peer_not_found() {
    let clock = Clock::default();
    let mut link = LinkStub::never_accepting(clock.clone(), TransportError::PeerNotFound);
    let mut presence = PresenceTracker::new();
    let mut discovery = DiscoveryLoop::new(RETRY_MS);
    let mut delay = ClockDelay(clock.clone());

    let deadline = async {
        while clock.get() < 3500 {
            yield_now().await;
        }
    };
    let outcome = block_on(select(
        discovery.run(&mut link, &mut presence, &PUMP, &mut delay),
        deadline,
    ));

    assert!(matches!(outcome, Either::Second(())), "discovery exited");
    assert!(discovery.attempts() >= 3);
    assert!(!presence.is_present());
    let times: Vec<u64> = link.sends.iter().map(|(_, t)| *t).collect();
    assert!(times.windows(2).all(|w| w[1] - w[0] == u64::from(RETRY_MS)));
    assert!(link.sends.iter().all(|(m, _)| !m.is_pedal_event));
}
