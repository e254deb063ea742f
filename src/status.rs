//! Operator-facing status: pedal position and pump presence.

/// What the panel should show. The two axes are independent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusView {
    pub pedal_down: bool,
    pub peer_present: bool,
}

impl StatusView {
    pub const fn pedal_label(&self) -> &'static str {
        if self.pedal_down {
            "Pedal down"
        } else {
            "Pedal up"
        }
    }

    pub const fn link_label(&self) -> &'static str {
        if self.peer_present {
            "Pump connected!"
        } else {
            "Pump disconnected!"
        }
    }

    /// The link line is drawn inverted while the pump is missing.
    pub const fn link_alert(&self) -> bool {
        !self.peer_present
    }
}

/// Fire-and-forget renderer for the status panel.
pub trait StatusPresenter {
    fn render(&mut self, pedal_down: bool, peer_present: bool);
}
