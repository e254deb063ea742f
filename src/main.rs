//! pedal-link - Wireless foot pedal for an ESP-NOW pump unit
//!
//! Firmware entry point for the ESP32 pedal board.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  debounced edges  ┌──────────────┐  Transport   ┌───────────┐
//! │ Foot pedal │ ────────────────► │  Controller  │ ───────────► │ link_task │ ─► ESP-NOW
//! │  (GPIO33)  │                   │  main loop   │ ◄─────────── │ (sender)  │
//! └────────────┘                   └──────────────┘  delivery    └───────────┘
//!                                         │          reports
//!                                         ▼
//!                                  ┌──────────────┐
//!                                  │ Panel (OLED  │
//!                                  │   + LED)     │
//!                                  └──────────────┘
//! ```

#![no_std]
#![no_main]

mod link;
mod ui;

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_time::{Delay, Instant, Timer};
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::efuse::Efuse;
use esp_hal::gpio::{Input, Level as PinLevel, Output, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _;
use esp_wifi::esp_now::EspNow;
use esp_wifi::EspWifiController;
use pedal_link::{config, Controller, DebouncedPin, DeliverySignal, PeerAddress, TransportError};
use static_cell::StaticCell;

/// Delivery reports from the link task to the controller.
static DELIVERY_REPORTS: DeliverySignal = DeliverySignal::new();

static RADIO: StaticCell<EspWifiController<'static>> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    esp_alloc::heap_allocator!(config::RADIO_HEAP_SIZE);

    let timg1 = TimerGroup::new(peripherals.TIMG1);
    esp_hal_embassy::init(timg1.timer0);

    info!("pedal-link starting...");

    // Display (optional)
    let display = match I2c::new(peripherals.I2C0, I2cConfig::default()) {
        Ok(i2c) => {
            let i2c = i2c
                .with_sda(peripherals.GPIO21)
                .with_scl(peripherals.GPIO22);
            match ui::display::init(i2c) {
                Ok(display) => Some(display),
                Err(e) => {
                    warn!("SSD1306 not responding ({}), running headless", e);
                    None
                }
            }
        }
        Err(_) => {
            warn!("I2C config rejected, running headless");
            None
        }
    };
    let led = Output::new(peripherals.GPIO2, PinLevel::High);
    let mut panel = ui::Panel::new(display, led, config::PUMP_ADDRESS);

    // Pedal
    let pedal_pin = Input::new(peripherals.GPIO33, Pull::None);
    let mut pedal = DebouncedPin::new(
        pedal_pin,
        || Instant::now().as_millis(),
        config::PEDAL_DEBOUNCE_MS,
    );

    // Radio
    Timer::after_millis(config::RADIO_SETTLE_MS).await;
    let own_address = PeerAddress::from(Efuse::read_base_mac_address());
    info!("Pedal MAC: {=str}", own_address.label().as_str());

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let rng = Rng::new(peripherals.RNG);
    let radio_clk = peripherals.RADIO_CLK;
    let wifi = peripherals.WIFI;
    let bring_up = move || -> Result<EspNow<'static>, TransportError> {
        let controller = esp_wifi::init(timg0.timer0, rng, radio_clk).map_err(|_| {
            error!("Wi-Fi init failed");
            TransportError::InternalError
        })?;
        let controller = RADIO.init(controller);
        EspNow::new(controller, wifi).map_err(|e| link::esp_now::transport_error(&e))
    };

    let transport = link::EspNowTransport::new(spawner, bring_up);
    let mut controller = Controller::new(transport, config::PUMP_ADDRESS, &DELIVERY_REPORTS);
    let mut delay = Delay;
    info!("Pump MAC: {=str}", controller.peer().label().as_str());

    match controller.start(&mut delay, &mut panel).await {
        Ok(attempts) => info!("Pump found after {} probe(s)", attempts),
        Err(e) => {
            error!("Link bring-up failed: {}, restarting", e);
            // Give the log a moment to drain.
            Timer::after_millis(100).await;
            esp_hal::reset::software_reset();
        }
    }

    controller
        .run(&mut pedal, &mut panel, &mut delay, config::PEDAL_POLL_MS)
        .await
}
