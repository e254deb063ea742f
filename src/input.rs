//! Pedal input: debounced edges from the foot switch.
//!
//! The switch pulls the pin HIGH while pressed. [`Debouncer`] uses a
//! stable-interval policy: the debounced level follows the raw level only
//! after the raw level has held steady for the whole interval, so contact
//! bounce never produces an edge.

use embedded_hal::digital::InputPin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Debounced input boundary consumed by the controller.
pub trait EdgeSource {
    /// Sample the input. Must be called once per main-loop iteration.
    fn poll(&mut self);

    /// True if the last `poll` changed the debounced level.
    fn changed(&self) -> bool;

    /// Current debounced level.
    fn level(&self) -> Level;
}

#[derive(Debug)]
pub struct Debouncer {
    interval_ms: u64,
    debounced: Level,
    unstable: Level,
    since_ms: u64,
    changed: bool,
}

impl Debouncer {
    pub const fn new(initial: Level, interval_ms: u64, now_ms: u64) -> Self {
        Self {
            interval_ms,
            debounced: initial,
            unstable: initial,
            since_ms: now_ms,
            changed: false,
        }
    }

    /// Feed one raw sample. Returns true if the debounced level changed.
    pub fn update(&mut self, raw: Level, now_ms: u64) -> bool {
        self.changed = false;

        if raw != self.unstable {
            self.unstable = raw;
            self.since_ms = now_ms;
        } else if now_ms.saturating_sub(self.since_ms) >= self.interval_ms
            && raw != self.debounced
        {
            self.debounced = raw;
            self.since_ms = now_ms;
            self.changed = true;
        }

        self.changed
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn level(&self) -> Level {
        self.debounced
    }
}

/// A digital pin plus a millisecond clock, debounced.
pub struct DebouncedPin<P, C> {
    pin: P,
    clock: C,
    debouncer: Debouncer,
}

impl<P, C> DebouncedPin<P, C>
where
    P: InputPin,
    C: FnMut() -> u64,
{
    /// Take the pin's current reading as the initial debounced level.
    pub fn new(mut pin: P, mut clock: C, interval_ms: u64) -> Self {
        let initial = pin.is_high().map(Level::from).unwrap_or(Level::Low);
        let now = clock();
        Self {
            pin,
            clock,
            debouncer: Debouncer::new(initial, interval_ms, now),
        }
    }
}

impl<P, C> EdgeSource for DebouncedPin<P, C>
where
    P: InputPin,
    C: FnMut() -> u64,
{
    fn poll(&mut self) {
        let now = (self.clock)();
        match self.pin.is_high() {
            Ok(high) => {
                self.debouncer.update(Level::from(high), now);
            }
            // A failed read counts as "no new sample".
            Err(_) => {
                self.debouncer.changed = false;
            }
        }
    }

    fn changed(&self) -> bool {
        self.debouncer.changed()
    }

    fn level(&self) -> Level {
        self.debouncer.level()
    }
}
