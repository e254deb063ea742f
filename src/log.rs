//! Logging shims.
//!
//! The library logs through these macros so that host builds (tests) carry
//! no logger at all while the firmware forwards everything to `defmt`.
//!
//! Textually scoped via `#[macro_use]` ahead of every other module in
//! `lib.rs`. A `use` re-export of `warn` is ambiguous with the built-in
//! attribute.

macro_rules! info {
    ( $($arg:tt)+ ) => (
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)+);
    );
}

macro_rules! warn {
    ( $($arg:tt)+ ) => (
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)+);
    );
}

macro_rules! error {
    ( $($arg:tt)+ ) => (
        #[cfg(feature = "defmt")]
        defmt::error!($($arg)+);
    );
}
