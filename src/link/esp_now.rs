//! ESP-NOW implementation of [`pedal_link::Transport`] on top of esp-wifi.
//!
//! `esp_now_send` reports its synchronous status on the first poll of
//! the send future; the acknowledgement arrives later through the
//! driver's send callback, which wakes the same future. The link task
//! splits the two: the status goes back to the caller via [`ACCEPTED`],
//! the acknowledgement goes to the registered [`DeliverySignal`].

use core::future::{poll_fn, Future};
use core::pin::pin;
use core::task::Poll;

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use esp_wifi::esp_now::{
    EspNow, EspNowError, EspNowManager, EspNowReceiver, EspNowSender, Error as RawError, PeerInfo,
};
use pedal_link::transport::{
    ESP_ERR_ESPNOW_ARG, ESP_ERR_ESPNOW_EXIST, ESP_ERR_ESPNOW_FULL, ESP_ERR_ESPNOW_IF,
    ESP_ERR_ESPNOW_INTERNAL, ESP_ERR_ESPNOW_NOT_FOUND, ESP_ERR_ESPNOW_NOT_INIT,
    ESP_ERR_ESPNOW_NO_MEM, ESP_OK,
};
use pedal_link::{
    await_delivery, classify, DeliveryOutcome, DeliveryReport, DeliverySignal, InFlight, Message,
    PeerAddress, Transport, TransportError,
};

use super::{Outbound, ACCEPTED, DELIVERY_SINK, OUTBOUND};

/// Generic `ESP_FAIL`; esp-wifi reports a missing acknowledgement this way.
const ESP_FAIL: i32 = -1;

/// ESP-NOW transport. `bring_up` runs once from [`Transport::init`] and
/// returns the driver handle (Wi-Fi init in station mode + ESP-NOW init).
pub struct EspNowTransport<F> {
    spawner: Spawner,
    bring_up: Option<F>,
    manager: Option<EspNowManager<'static>>,
    // Kept alive with the driver; the pump never replies.
    _receiver: Option<EspNowReceiver<'static>>,
}

impl<F> EspNowTransport<F>
where
    F: FnOnce() -> Result<EspNow<'static>, TransportError>,
{
    pub fn new(spawner: Spawner, bring_up: F) -> Self {
        Self {
            spawner,
            bring_up: Some(bring_up),
            manager: None,
            _receiver: None,
        }
    }

    fn ensure_initialised(&self) -> Result<(), TransportError> {
        if self.manager.is_some() {
            Ok(())
        } else {
            Err(TransportError::NotInitialized)
        }
    }
}

impl<F> Transport for EspNowTransport<F>
where
    F: FnOnce() -> Result<EspNow<'static>, TransportError>,
{
    async fn init(&mut self) -> Result<(), TransportError> {
        let bring_up = self.bring_up.take().ok_or(TransportError::InternalError)?;
        let esp_now = bring_up()?;

        if let Ok(version) = esp_now.version() {
            info!("ESP-NOW version {}", version);
        }

        let (manager, sender, receiver) = esp_now.split();
        self.spawner.spawn(link_task(sender)).map_err(|_| {
            error!("Failed to spawn link task");
            TransportError::OutOfMemory
        })?;

        self.manager = Some(manager);
        self._receiver = Some(receiver);
        Ok(())
    }

    fn register_delivery_callback(
        &mut self,
        reports: &'static DeliverySignal,
    ) -> Result<(), TransportError> {
        self.ensure_initialised()?;
        match DELIVERY_SINK.init(reports) {
            Ok(()) => Ok(()),
            // Re-registering the same cell is a no-op.
            Err(_) if DELIVERY_SINK
                .try_get()
                .is_some_and(|current| core::ptr::eq(*current, reports)) =>
            {
                Ok(())
            }
            Err(_) => Err(TransportError::BadArgument),
        }
    }

    async fn register_peer(&mut self, peer: &PeerAddress) -> Result<(), TransportError> {
        let manager = self.manager.as_ref().ok_or(TransportError::NotInitialized)?;
        manager
            .add_peer(PeerInfo {
                peer_address: *peer.octets(),
                lmk: None,
                channel: None,
                encrypt: false,
            })
            .map_err(|e| transport_error(&e))
    }

    async fn send(&mut self, peer: &PeerAddress, message: Message) -> Result<(), TransportError> {
        self.ensure_initialised()?;
        OUTBOUND
            .send(Outbound {
                peer: *peer,
                message,
            })
            .await;
        ACCEPTED.wait().await
    }
}

/// Owns the ESP-NOW sender. A frame still waiting for its acknowledgement
/// is abandoned as soon as the next one is queued.
#[embassy_executor::task]
async fn link_task(mut sender: EspNowSender<'static>) {
    info!("Link task started");

    let mut queued: Option<Outbound> = None;
    loop {
        let Outbound { peer, message } = match queued.take() {
            Some(frame) => frame,
            None => OUTBOUND.receive().await,
        };
        let frame = message.encode();
        let address = *peer.octets();

        let mut send = pin!(sender.send_async(&address, &frame));
        let first = poll_fn(|cx| Poll::Ready(send.as_mut().poll(cx))).await;

        let outcome = match first {
            Poll::Ready(Err(EspNowError::SendFailed)) => {
                ACCEPTED.signal(Ok(()));
                DeliveryOutcome::Failed
            }
            Poll::Ready(Err(e)) => {
                ACCEPTED.signal(Err(transport_error(&e)));
                continue;
            }
            Poll::Ready(Ok(())) => {
                ACCEPTED.signal(Ok(()));
                DeliveryOutcome::Delivered
            }
            Poll::Pending => {
                ACCEPTED.signal(Ok(()));
                match await_delivery(send.as_mut(), OUTBOUND.receive()).await {
                    InFlight::Resolved(outcome) => outcome,
                    InFlight::Superseded(next) => {
                        warn!("Report for previous frame to {} dropped", peer);
                        queued = Some(next);
                        continue;
                    }
                }
            }
        };

        match DELIVERY_SINK.try_get() {
            Some(reports) => reports.signal(DeliveryReport { peer, outcome }),
            None => warn!("Delivery report for {} dropped: no callback", peer),
        }
    }
}

/// Translate an esp-wifi error into the shared error type.
pub fn transport_error(e: &EspNowError) -> TransportError {
    match classify(status_code(e)) {
        Err(kind) => kind,
        Ok(()) => TransportError::Unknown(ESP_OK),
    }
}

fn status_code(e: &EspNowError) -> i32 {
    match e {
        EspNowError::Error(raw) => match raw {
            RawError::NotInitialized => ESP_ERR_ESPNOW_NOT_INIT,
            RawError::InvalidArgument => ESP_ERR_ESPNOW_ARG,
            RawError::OutOfMemory => ESP_ERR_ESPNOW_NO_MEM,
            RawError::PeerListFull => ESP_ERR_ESPNOW_FULL,
            RawError::UnknownPeer => ESP_ERR_ESPNOW_NOT_FOUND,
            // esp-wifi names ESP_ERR_ESPNOW_INTERNAL `NotFound`.
            RawError::NotFound => ESP_ERR_ESPNOW_INTERNAL,
            RawError::PeerExists => ESP_ERR_ESPNOW_EXIST,
            RawError::InterfaceError => ESP_ERR_ESPNOW_IF,
            RawError::Other(code) => *code as i32,
        },
        EspNowError::SendFailed => ESP_FAIL,
        EspNowError::DuplicateInstance | EspNowError::Initialization(_) => ESP_ERR_ESPNOW_NOT_INIT,
    }
}
