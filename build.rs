//! Build script - passes the ESP32 linker scripts to the firmware binary.
//!
//! Host builds (`cargo test`) leave the link line alone so the library
//! and its tests link against the native toolchain.

use std::env;

fn main() {
    if env::var_os("CARGO_FEATURE_EMBEDDED").is_some() {
        // Memory layout and vector table from esp-hal.
        println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
        // ROM symbols used by the esp-wifi blobs.
        println!("cargo:rustc-link-arg-bins=-Trom_functions.x");
        // defmt frame table.
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
