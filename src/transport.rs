//! Transport boundary: connectionless unicast datagrams to one peer.
//!
//! The radio reports two things per send:
//!
//! 1. whether it **accepted** the frame (synchronous status code), and
//! 2. later, from its own completion context, whether the peer
//!    **acknowledged** it (the delivery report).
//!
//! Status codes from every call site (init, callback registration, peer
//! registration, send) go through [`classify`] and [`log_result`], so each
//! site only decides whether an error is fatal.

use core::future::{poll_fn, Future};
use core::pin::pin;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::message::Message;
use crate::peer::PeerAddress;

// ESP-NOW status codes (`esp_err_t`).
pub const ESP_OK: i32 = 0;
pub const ESP_ERR_ESPNOW_BASE: i32 = 0x3064;
pub const ESP_ERR_ESPNOW_NOT_INIT: i32 = ESP_ERR_ESPNOW_BASE + 1;
pub const ESP_ERR_ESPNOW_ARG: i32 = ESP_ERR_ESPNOW_BASE + 2;
pub const ESP_ERR_ESPNOW_NO_MEM: i32 = ESP_ERR_ESPNOW_BASE + 3;
pub const ESP_ERR_ESPNOW_FULL: i32 = ESP_ERR_ESPNOW_BASE + 4;
pub const ESP_ERR_ESPNOW_NOT_FOUND: i32 = ESP_ERR_ESPNOW_BASE + 5;
pub const ESP_ERR_ESPNOW_INTERNAL: i32 = ESP_ERR_ESPNOW_BASE + 6;
pub const ESP_ERR_ESPNOW_EXIST: i32 = ESP_ERR_ESPNOW_BASE + 7;
pub const ESP_ERR_ESPNOW_IF: i32 = ESP_ERR_ESPNOW_BASE + 8;

/// Reasons the transport refused a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The radio stack was never brought up.
    NotInitialized,
    /// Bad peer address, payload or parameter.
    BadArgument,
    /// Driver-internal failure.
    InternalError,
    /// Driver could not allocate a buffer.
    OutOfMemory,
    /// Destination is not in the peer list.
    PeerNotFound,
    /// Peer registered on a different Wi-Fi interface than the one in use.
    InterfaceMismatch,
    /// Peer list is full (registration only).
    PeerListFull,
    /// Peer is already registered (registration only).
    PeerExists,
    /// Any other status code.
    Unknown(i32),
}

impl TransportError {
    /// Raw `esp_err_t` for this error.
    pub const fn code(&self) -> i32 {
        match self {
            TransportError::NotInitialized => ESP_ERR_ESPNOW_NOT_INIT,
            TransportError::BadArgument => ESP_ERR_ESPNOW_ARG,
            TransportError::InternalError => ESP_ERR_ESPNOW_INTERNAL,
            TransportError::OutOfMemory => ESP_ERR_ESPNOW_NO_MEM,
            TransportError::PeerNotFound => ESP_ERR_ESPNOW_NOT_FOUND,
            TransportError::InterfaceMismatch => ESP_ERR_ESPNOW_IF,
            TransportError::PeerListFull => ESP_ERR_ESPNOW_FULL,
            TransportError::PeerExists => ESP_ERR_ESPNOW_EXIST,
            TransportError::Unknown(code) => *code,
        }
    }

    /// Operator-facing log text.
    pub const fn describe(&self) -> &'static str {
        match self {
            TransportError::NotInitialized => "ESP-NOW not initialised",
            TransportError::BadArgument => "ESP-NOW invalid argument",
            TransportError::InternalError => "ESP-NOW internal error",
            TransportError::OutOfMemory => "ESP-NOW out of memory",
            TransportError::PeerNotFound => "ESP-NOW peer not found",
            TransportError::InterfaceMismatch => "ESP-NOW peer interface mismatch",
            TransportError::PeerListFull => "ESP-NOW peer list full",
            TransportError::PeerExists => "ESP-NOW peer already registered",
            TransportError::Unknown(_) => "ESP-NOW unknown error",
        }
    }
}

/// Map a raw status code onto the shared result type.
pub const fn classify(code: i32) -> Result<(), TransportError> {
    match code {
        ESP_OK => Ok(()),
        ESP_ERR_ESPNOW_NOT_INIT => Err(TransportError::NotInitialized),
        ESP_ERR_ESPNOW_ARG => Err(TransportError::BadArgument),
        ESP_ERR_ESPNOW_NO_MEM => Err(TransportError::OutOfMemory),
        ESP_ERR_ESPNOW_FULL => Err(TransportError::PeerListFull),
        ESP_ERR_ESPNOW_NOT_FOUND => Err(TransportError::PeerNotFound),
        ESP_ERR_ESPNOW_INTERNAL => Err(TransportError::InternalError),
        ESP_ERR_ESPNOW_EXIST => Err(TransportError::PeerExists),
        ESP_ERR_ESPNOW_IF => Err(TransportError::InterfaceMismatch),
        other => Err(TransportError::Unknown(other)),
    }
}

/// Which request a status code belongs to (log context only).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    Init,
    RegisterCallback,
    RegisterPeer,
    Probe,
    PedalEvent,
}

impl Operation {
    pub const fn describe(&self) -> &'static str {
        match self {
            Operation::Init => "ESP-NOW init",
            Operation::RegisterCallback => "delivery callback registration",
            Operation::RegisterPeer => "peer registration",
            Operation::Probe => "connect probe",
            Operation::PedalEvent => "pedal press",
        }
    }
}

/// Log the outcome of a transport request, one line per distinct error.
#[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
pub fn log_result(op: Operation, result: &Result<(), TransportError>) {
    match result {
        Ok(()) => {
            info!("{}: ok", op.describe());
        }
        Err(e) => {
            warn!("{}: {} (code {=i32:#x})", op.describe(), e.describe(), e.code());
        }
    }
}

/// Final fate of a frame the transport accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeliveryOutcome {
    /// The peer acknowledged the frame.
    Delivered,
    /// No acknowledgement before the driver gave up.
    Failed,
}

impl DeliveryOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeliveryReport {
    pub peer: PeerAddress,
    pub outcome: DeliveryOutcome,
}

/// Latest-value cell for delivery reports.
///
/// Written by the transport's completion context, drained by the
/// controller without blocking. A newer report overwrites an unread one.
pub type DeliverySignal = Signal<CriticalSectionRawMutex, DeliveryReport>;

/// How the wait on an accepted frame ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InFlight<T> {
    /// The driver reported the frame's fate.
    Resolved(DeliveryOutcome),
    /// Another frame was queued first. The earlier frame gets no report.
    Superseded(T),
}

/// Wait for the acknowledgement of the frame in flight, giving up as soon
/// as `next` yields another frame to send.
///
/// The sender must never sit behind an unresolved acknowledgement: a new
/// frame is accepted (or rejected) right away. If both are ready the
/// acknowledgement wins.
pub async fn await_delivery<A, N, E, T>(ack: A, next: N) -> InFlight<T>
where
    A: Future<Output = Result<(), E>>,
    N: Future<Output = T>,
{
    let mut ack = pin!(ack);
    let mut next = pin!(next);
    poll_fn(|cx| {
        if let Poll::Ready(result) = ack.as_mut().poll(cx) {
            let outcome = if result.is_ok() {
                DeliveryOutcome::Delivered
            } else {
                DeliveryOutcome::Failed
            };
            return Poll::Ready(InFlight::Resolved(outcome));
        }
        next.as_mut().poll(cx).map(InFlight::Superseded)
    })
    .await
}

/// Radio seam. Implemented over ESP-NOW on target and by scripted
/// stubs in tests.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Bring the radio stack up.
    async fn init(&mut self) -> Result<(), TransportError>;

    /// Hand the transport the cell it publishes delivery reports into.
    /// Must not block; reports arrive later from the transport's own context.
    fn register_delivery_callback(
        &mut self,
        reports: &'static DeliverySignal,
    ) -> Result<(), TransportError>;

    /// Add the peer to the transport's peer list.
    async fn register_peer(&mut self, peer: &PeerAddress) -> Result<(), TransportError>;

    /// Queue one frame. `Ok` means the transport accepted it, not that the
    /// peer received it.
    async fn send(&mut self, peer: &PeerAddress, message: Message) -> Result<(), TransportError>;
}
