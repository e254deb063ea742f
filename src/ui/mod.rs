//! User interface subsystem - OLED status panel + pedal LED.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×32 OLED via I²C (optional; the unit runs
//!   headless if it does not answer at boot)
//! - **LED**: on-board LED, lit while the pedal is up

pub mod display;

use embedded_hal::digital::OutputPin;
use heapless::String;
use pedal_link::peer::PEER_LABEL_LEN;
use pedal_link::{PeerAddress, StatusPresenter, StatusView};

use self::display::Display;

/// Front panel: renders every status change to the OLED and the LED.
pub struct Panel<I2C, LED> {
    display: Option<Display<I2C>>,
    led: LED,
    peer_label: String<PEER_LABEL_LEN>,
}

impl<I2C, LED> Panel<I2C, LED>
where
    I2C: embedded_hal::i2c::I2c,
    LED: OutputPin,
{
    pub fn new(display: Option<Display<I2C>>, led: LED, peer: PeerAddress) -> Self {
        Self {
            display,
            led,
            peer_label: peer.label(),
        }
    }
}

impl<I2C, LED> StatusPresenter for Panel<I2C, LED>
where
    I2C: embedded_hal::i2c::I2c,
    LED: OutputPin,
{
    fn render(&mut self, pedal_down: bool, peer_present: bool) {
        let view = StatusView {
            pedal_down,
            peer_present,
        };

        // LED is wired active-high; dark while the pedal is held.
        let _ = if pedal_down {
            self.led.set_low()
        } else {
            self.led.set_high()
        };

        if let Some(display) = self.display.as_mut() {
            display::draw_status(display, view, self.peer_label.as_str());
        }
    }
}
