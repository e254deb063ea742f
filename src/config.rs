//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use crate::peer::PeerAddress;

// Link

/// MAC address of the pump unit. Change to match your pump.
pub const PUMP_ADDRESS: PeerAddress = PeerAddress::new([0x84, 0xCC, 0xA8, 0x2C, 0x0D, 0xA8]);

/// Pause between rejected discovery probes (ms).
pub const DISCOVERY_RETRY_MS: u32 = 1000;

/// Wait after bringing the radio up in station mode before ESP-NOW init (ms).
pub const RADIO_SETTLE_MS: u64 = 1500;

/// Heap handed to `esp-alloc` for the Wi-Fi driver (bytes).
pub const RADIO_HEAP_SIZE: usize = 72 * 1024;

// Pedal input

/// Debounce interval for the foot switch (ms).
pub const PEDAL_DEBOUNCE_MS: u64 = 5;

/// Main loop polling period (ms). Must stay below the debounce interval.
pub const PEDAL_POLL_MS: u32 = 1;

// Display

/// SSD1306 I²C address (0x3C for 128x32 modules, 0x3D for most 128x64).
pub const DISPLAY_I2C_ADDRESS: u8 = 0x3C;

/// Panel width (pixels); the 128x32 geometry itself is fixed by the driver type.
pub const DISPLAY_WIDTH: u32 = 128;

// GPIO pin assignments (ESP32 DevKit defaults)
//
// These are logical names; actual `esp_hal::peripherals::*` pins are
// selected in `main.rs`.  Adjust for your own wiring.
//
//   Pedal switch   → GPIO33 (external pull-down, HIGH when pressed)
//   I²C SDA        → GPIO21
//   I²C SCL        → GPIO22
//   Status LED     → GPIO2  (on while the pedal is up)
